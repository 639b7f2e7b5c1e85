//! Allocation calculator: per-invoice amounts, totals and validity.
//!
//! The receipt's unallocated amount is snapshotted when the calculator is
//! built and never changes afterwards. Totals are recomputed on every query;
//! candidate sets are bounded by a customer's open invoices.

use std::collections::HashMap;

use receivables_core::{Entity, InvoiceId, Money, ReceiptId};
use receivables_invoicing::{
    AllocatedAmount, AllocationRequest, Invoice, Receipt, open_for_allocation,
};

use crate::error::AllocationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationCalculator {
    receipt_id: ReceiptId,
    unallocated: Money,
    candidates: Vec<Invoice>,
    amounts: HashMap<InvoiceId, Money>,
}

impl AllocationCalculator {
    /// Start a calculation for `receipt` over the provider's invoice sequence.
    ///
    /// Void and settled invoices are dropped; provider order is kept.
    pub fn new(
        receipt: &Receipt,
        invoices: impl IntoIterator<Item = Invoice>,
    ) -> Result<Self, AllocationError> {
        if !receipt.can_allocate() {
            return Err(AllocationError::ReceiptNotAllocatable {
                receipt_id: receipt.id().clone(),
                reason: format!(
                    "status {:?} with {} unallocated",
                    receipt.status(),
                    receipt.unallocated_amount()
                ),
            });
        }

        Ok(Self {
            receipt_id: receipt.id().clone(),
            unallocated: receipt.unallocated_amount(),
            candidates: open_for_allocation(invoices),
            amounts: HashMap::new(),
        })
    }

    pub fn receipt_id(&self) -> &ReceiptId {
        &self.receipt_id
    }

    /// The unallocated amount snapshotted at session start.
    pub fn unallocated_amount(&self) -> Money {
        self.unallocated
    }

    pub fn candidates(&self) -> &[Invoice] {
        &self.candidates
    }

    fn candidate(&self, invoice_id: &InvoiceId) -> Result<&Invoice, AllocationError> {
        self.candidates
            .iter()
            .find(|inv| &inv.id == invoice_id)
            .ok_or_else(|| AllocationError::UnknownInvoice(invoice_id.clone()))
    }

    /// Store `amount` for the invoice, replacing any previous value.
    ///
    /// Negative amounts and amounts above [`Money::MAX_INPUT`] are rejected
    /// and leave the stored value untouched.
    /// Amounts above the invoice balance are stored but flagged by
    /// [`Self::violations`].
    pub fn set_amount(&mut self, invoice_id: &InvoiceId, amount: Money) -> Result<(), AllocationError> {
        self.candidate(invoice_id)?;

        if amount.is_negative() {
            tracing::warn!(invoice_id = %invoice_id, %amount, "rejected negative allocation amount");
            return Err(AllocationError::InvalidAmount {
                invoice_id: invoice_id.clone(),
                reason: "amount must not be negative".to_string(),
            });
        }

        if amount > Money::MAX_INPUT {
            tracing::warn!(invoice_id = %invoice_id, %amount, "rejected oversized allocation amount");
            return Err(AllocationError::InvalidAmount {
                invoice_id: invoice_id.clone(),
                reason: format!("amount must not exceed {}", Money::MAX_INPUT),
            });
        }

        tracing::debug!(invoice_id = %invoice_id, %amount, "allocation amount set");
        self.amounts.insert(invoice_id.clone(), amount);
        Ok(())
    }

    /// Text-field variant of [`Self::set_amount`]. Empty input clears the line.
    pub fn set_amount_input(&mut self, invoice_id: &InvoiceId, raw: &str) -> Result<(), AllocationError> {
        if raw.trim().is_empty() {
            return self.set_amount(invoice_id, Money::ZERO);
        }

        let amount = Money::parse(raw).map_err(|e| {
            tracing::warn!(invoice_id = %invoice_id, input = raw, "rejected malformed allocation amount");
            AllocationError::InvalidAmount {
                invoice_id: invoice_id.clone(),
                reason: e.to_string(),
            }
        })?;
        self.set_amount(invoice_id, amount)
    }

    /// Drop the line for an invoice (same effect as setting it to zero).
    pub fn clear(&mut self, invoice_id: &InvoiceId) {
        self.amounts.remove(invoice_id);
    }

    pub fn amount_for(&self, invoice_id: &InvoiceId) -> Money {
        self.amounts.get(invoice_id).copied().unwrap_or(Money::ZERO)
    }

    /// Largest amount the invoice can take: `min(balance, unallocated)`.
    pub fn max_for(&self, invoice_id: &InvoiceId) -> Option<Money> {
        self.candidate(invoice_id)
            .ok()
            .map(|inv| inv.balance.min(self.unallocated))
    }

    pub fn total_allocated(&self) -> Money {
        self.amounts.values().sum()
    }

    /// Funds left to allocate. Negative when over-allocated.
    pub fn remaining(&self) -> Money {
        self.unallocated - self.total_allocated()
    }

    pub fn line_exceeds_balance(&self, invoice_id: &InvoiceId) -> bool {
        self.candidate(invoice_id)
            .is_ok_and(|inv| self.amount_for(invoice_id) > inv.balance)
    }

    /// Every condition currently blocking submission, for inline display.
    ///
    /// Per-line violations come first in candidate order, then
    /// over-allocation, then the empty check.
    pub fn violations(&self) -> Vec<AllocationError> {
        let mut out: Vec<AllocationError> = self
            .candidates
            .iter()
            .filter_map(|inv| {
                let amount = self.amount_for(&inv.id);
                (amount > inv.balance).then(|| AllocationError::PerLineExceedsBalance {
                    invoice_id: inv.id.clone(),
                    amount,
                    balance: inv.balance,
                })
            })
            .collect();

        let remaining = self.remaining();
        if remaining.is_negative() {
            out.push(AllocationError::OverAllocation { excess: -remaining });
        }
        if self.total_allocated().is_zero() {
            out.push(AllocationError::EmptyAllocation);
        }
        out
    }

    pub fn validate(&self) -> Result<(), AllocationError> {
        match self.violations().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Positive lines in candidate (provider) order.
    pub fn lines(&self) -> Vec<AllocatedAmount> {
        self.candidates
            .iter()
            .filter_map(|inv| {
                let amount = self.amount_for(&inv.id);
                amount.is_positive().then(|| AllocatedAmount {
                    invoice_id: inv.id.clone(),
                    amount,
                })
            })
            .collect()
    }

    /// Build the request to hand to the submitter. Fails while invalid.
    pub fn to_request(&self) -> Result<AllocationRequest, AllocationError> {
        self.validate()?;
        Ok(AllocationRequest::new(self.receipt_id.clone(), self.lines())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use receivables_core::CustomerId;
    use receivables_invoicing::{InvoiceStatus, ReceiptStatus};

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn id(s: &str) -> InvoiceId {
        InvoiceId::new(s).unwrap()
    }

    fn receipt(unallocated: &str) -> Receipt {
        Receipt::new(
            ReceiptId::new("R-1").unwrap(),
            CustomerId::new("C-1").unwrap(),
            "RCPT-0001",
            money(unallocated),
            money(unallocated),
            ReceiptStatus::Unallocated,
        )
        .unwrap()
    }

    fn invoice(inv_id: &str, balance: Money, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: id(inv_id),
            customer_id: None,
            number: format!("INV-{inv_id}"),
            date: None,
            due_date: None,
            total_amount: balance,
            balance,
            status,
        }
    }

    /// Receipt of 500.00; invoices A (300) and B (250).
    fn two_invoice_calculator() -> AllocationCalculator {
        AllocationCalculator::new(
            &receipt("500"),
            vec![
                invoice("A", money("300"), InvoiceStatus::Unpaid),
                invoice("B", money("250"), InvoiceStatus::Unpaid),
            ],
        )
        .unwrap()
    }

    #[test]
    fn over_allocation_is_invalid() {
        let mut calc = two_invoice_calculator();
        calc.set_amount(&id("A"), money("300")).unwrap();
        calc.set_amount(&id("B"), money("250")).unwrap();

        assert_eq!(calc.total_allocated(), money("550"));
        assert_eq!(calc.remaining(), money("-50"));
        assert!(!calc.is_valid());
        assert_eq!(
            calc.violations(),
            vec![AllocationError::OverAllocation { excess: money("50") }]
        );
        assert!(matches!(
            calc.to_request(),
            Err(AllocationError::OverAllocation { .. })
        ));
    }

    #[test]
    fn exact_allocation_produces_request_in_provider_order() {
        let mut calc = two_invoice_calculator();
        calc.set_amount(&id("B"), money("200")).unwrap();
        calc.set_amount(&id("A"), money("300")).unwrap();

        assert_eq!(calc.total_allocated(), money("500"));
        assert!(calc.remaining().is_zero());
        assert!(calc.is_valid());

        let req = calc.to_request().unwrap();
        assert_eq!(req.receipt_id().as_str(), "R-1");
        assert_eq!(
            req.allocations(),
            &[
                AllocatedAmount { invoice_id: id("A"), amount: money("300") },
                AllocatedAmount { invoice_id: id("B"), amount: money("200") },
            ]
        );
    }

    #[test]
    fn negative_amount_leaves_prior_value() {
        let mut calc = two_invoice_calculator();
        calc.set_amount(&id("A"), money("-10")).unwrap_err();
        assert_eq!(calc.amount_for(&id("A")), Money::ZERO);

        calc.set_amount(&id("A"), money("40")).unwrap();
        let err = calc.set_amount_input(&id("A"), "-10").unwrap_err();
        assert!(matches!(err, AllocationError::InvalidAmount { .. }));
        assert_eq!(calc.amount_for(&id("A")), money("40"));
        assert_eq!(calc.total_allocated(), money("40"));
    }

    #[test]
    fn malformed_input_is_rejected_and_empty_input_clears() {
        let mut calc = two_invoice_calculator();
        calc.set_amount_input(&id("A"), "120.50").unwrap();

        for bad in ["abc", "12.345", "1,000"] {
            let err = calc.set_amount_input(&id("A"), bad).unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(calc.amount_for(&id("A")), money("120.50"));

        calc.set_amount_input(&id("A"), "  ").unwrap();
        assert_eq!(calc.amount_for(&id("A")), Money::ZERO);
    }

    #[test]
    fn oversized_input_is_rejected_without_overflow() {
        let mut calc = two_invoice_calculator();
        let huge = "79228162514264337593543950335";

        for inv in ["A", "B"] {
            let err = calc.set_amount_input(&id(inv), huge).unwrap_err();
            assert!(err.is_validation());
        }
        let err = calc
            .set_amount(&id("A"), Money::from_cents(i64::MAX))
            .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidAmount { .. }));

        assert_eq!(calc.total_allocated(), Money::ZERO);
        assert!(!calc.is_valid());
        assert_eq!(calc.violations(), vec![AllocationError::EmptyAllocation]);
    }

    #[test]
    fn last_write_wins() {
        let mut calc = two_invoice_calculator();
        calc.set_amount(&id("A"), money("100")).unwrap();
        calc.set_amount(&id("A"), money("75")).unwrap();
        assert_eq!(calc.total_allocated(), money("75"));
    }

    #[test]
    fn line_above_invoice_balance_blocks_even_with_funds_left() {
        let calc_receipt = receipt("500");
        let mut calc = AllocationCalculator::new(
            &calc_receipt,
            vec![invoice("A", money("30"), InvoiceStatus::Unpaid)],
        )
        .unwrap();

        calc.set_amount(&id("A"), money("50")).unwrap();
        assert!(calc.remaining().is_positive());
        assert!(calc.line_exceeds_balance(&id("A")));
        assert_eq!(
            calc.to_request().unwrap_err(),
            AllocationError::PerLineExceedsBalance {
                invoice_id: id("A"),
                amount: money("50"),
                balance: money("30"),
            }
        );
    }

    #[test]
    fn zero_total_is_empty_allocation() {
        let mut calc = two_invoice_calculator();
        assert_eq!(calc.to_request().unwrap_err(), AllocationError::EmptyAllocation);

        calc.set_amount(&id("A"), Money::ZERO).unwrap();
        assert_eq!(calc.validate().unwrap_err(), AllocationError::EmptyAllocation);
    }

    #[test]
    fn zero_lines_are_not_submitted() {
        let mut calc = two_invoice_calculator();
        calc.set_amount(&id("A"), money("10")).unwrap();
        calc.set_amount(&id("B"), Money::ZERO).unwrap();

        let req = calc.to_request().unwrap();
        assert_eq!(req.allocations().len(), 1);
        assert_eq!(req.allocations()[0].invoice_id, id("A"));
    }

    #[test]
    fn void_and_settled_invoices_are_not_candidates() {
        let mut calc = AllocationCalculator::new(
            &receipt("100"),
            vec![
                invoice("A", money("50"), InvoiceStatus::Void),
                invoice("B", Money::ZERO, InvoiceStatus::Paid),
                invoice("C", money("20"), InvoiceStatus::Overdue),
            ],
        )
        .unwrap();

        assert_eq!(calc.candidates().len(), 1);
        assert_eq!(
            calc.set_amount(&id("A"), money("10")).unwrap_err(),
            AllocationError::UnknownInvoice(id("A"))
        );
        assert_eq!(calc.max_for(&id("C")), Some(money("20")));
        assert_eq!(calc.max_for(&id("B")), None);
    }

    #[test]
    fn duplicate_invoice_rows_yield_single_line() {
        let mut calc = AllocationCalculator::new(
            &receipt("500"),
            vec![
                invoice("A", money("300"), InvoiceStatus::Unpaid),
                invoice("A", money("300"), InvoiceStatus::Unpaid),
            ],
        )
        .unwrap();
        assert_eq!(calc.candidates().len(), 1);

        calc.set_amount(&id("A"), money("100")).unwrap();
        assert_eq!(calc.total_allocated(), money("100"));

        let req = calc.to_request().unwrap();
        assert_eq!(
            req.allocations(),
            &[AllocatedAmount { invoice_id: id("A"), amount: money("100") }]
        );
    }

    #[test]
    fn max_for_is_bounded_by_unallocated() {
        let calc = two_invoice_calculator();
        let small = AllocationCalculator::new(
            &receipt("100"),
            calc.candidates().to_vec(),
        )
        .unwrap();
        assert_eq!(calc.max_for(&id("A")), Some(money("300")));
        assert_eq!(small.max_for(&id("A")), Some(money("100")));
    }

    #[test]
    fn fully_allocated_receipt_cannot_start() {
        let spent = Receipt::new(
            ReceiptId::new("R-2").unwrap(),
            CustomerId::new("C-1").unwrap(),
            "RCPT-0002",
            money("100"),
            Money::ZERO,
            ReceiptStatus::Allocated,
        )
        .unwrap();

        let err = AllocationCalculator::new(&spent, Vec::new()).unwrap_err();
        assert!(matches!(err, AllocationError::ReceiptNotAllocatable { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after any sequence of edits the calculator's totals are
        /// consistent, rejected input changes nothing, and every submittable
        /// request respects both the aggregate and the per-line bounds.
        #[test]
        fn allocation_invariants_hold(
            unallocated_cents in 1i64..200_000i64,
            balances in prop::collection::vec(1i64..100_000i64, 1..6),
            edits in prop::collection::vec((0usize..6, -50_000i64..120_000i64), 0..20),
        ) {
            let invoices: Vec<Invoice> = balances
                .iter()
                .enumerate()
                .map(|(i, cents)| invoice(&format!("I{i}"), Money::from_cents(*cents), InvoiceStatus::Unpaid))
                .collect();
            let r = Receipt::new(
                ReceiptId::new("R-P").unwrap(),
                CustomerId::new("C-P").unwrap(),
                "RCPT-P",
                Money::from_cents(unallocated_cents),
                Money::from_cents(unallocated_cents),
                ReceiptStatus::Unallocated,
            ).unwrap();
            let mut calc = AllocationCalculator::new(&r, invoices.clone()).unwrap();

            for (idx, cents) in edits {
                let inv_id = id(&format!("I{}", idx % invoices.len()));
                let before = calc.total_allocated();
                let result = calc.set_amount(&inv_id, Money::from_cents(cents));
                if cents < 0 {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(calc.total_allocated(), before);
                }
                prop_assert_eq!(calc.remaining(), calc.unallocated_amount() - calc.total_allocated());
            }

            match calc.to_request() {
                Ok(req) => {
                    prop_assert!(req.total() <= calc.unallocated_amount());
                    for line in req.allocations() {
                        prop_assert!(line.amount.is_positive());
                        let inv = invoices.iter().find(|i| i.id == line.invoice_id).unwrap();
                        prop_assert!(line.amount <= inv.balance);
                    }
                    prop_assert_eq!(calc.to_request().unwrap(), req);
                }
                Err(err) => {
                    prop_assert!(!calc.is_valid());
                    prop_assert!(err.is_validation());
                }
            }
        }
    }
}
