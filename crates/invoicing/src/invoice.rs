use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use receivables_core::{CustomerId, DomainError, Entity, InvoiceId, Money};

/// Invoice status lifecycle as reported by the AR backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[serde(alias = "Draft")]
    Draft,
    #[serde(alias = "Posted")]
    Posted,
    #[serde(alias = "Unpaid")]
    Unpaid,
    #[serde(alias = "Overdue")]
    Overdue,
    #[serde(alias = "Paid")]
    Paid,
    #[serde(alias = "Void")]
    Void,
}

/// Snapshot of an invoice with its outstanding balance.
///
/// The backend owns balances; the client only refreshes a snapshot
/// optimistically after a successful allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: Option<CustomerId>,
    pub number: String,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Money,
    /// Amount still owed after prior allocations.
    pub balance: Money,
    pub status: InvoiceStatus,
}

impl Invoice {
    /// Invariant: void and settled invoices cannot receive funds.
    pub fn can_accept_payment(&self) -> bool {
        self.status != InvoiceStatus::Void && self.balance.is_positive()
    }

    pub fn amount_paid(&self) -> Money {
        self.total_amount - self.balance
    }

    /// Days past the due date as of `as_of`; negative while not yet due.
    /// Invoices without a due date are treated as due on their issue date.
    pub fn days_past_due(&self, as_of: NaiveDate) -> Option<i64> {
        self.due_date
            .or(self.date)
            .map(|due| as_of.signed_duration_since(due).num_days())
    }

    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.can_accept_payment() && self.days_past_due(as_of).is_some_and(|d| d > 0)
    }

    /// Optimistically apply an allocated amount to the snapshot.
    pub fn apply_allocated(&mut self, amount: Money) -> Result<(), DomainError> {
        if !self.can_accept_payment() {
            return Err(DomainError::invariant(
                "cannot allocate to void or fully paid invoice",
            ));
        }
        if !amount.is_positive() {
            return Err(DomainError::invalid_amount("allocated amount must be positive"));
        }
        if amount > self.balance {
            return Err(DomainError::invariant("cannot overpay invoice"));
        }

        self.balance -= amount;
        if self.balance.is_zero() {
            self.status = InvoiceStatus::Paid;
        }
        Ok(())
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Filter a provider's invoice sequence down to allocation candidates,
/// preserving the provider's order.
///
/// An id seen twice keeps its first snapshot; later copies are dropped.
pub fn open_for_allocation(invoices: impl IntoIterator<Item = Invoice>) -> Vec<Invoice> {
    let mut seen = HashSet::new();
    invoices
        .into_iter()
        .filter(Invoice::can_accept_payment)
        .filter(|inv| {
            let first = seen.insert(inv.id.clone());
            if !first {
                tracing::warn!(invoice_id = %inv.id, "duplicate invoice from provider ignored");
            }
            first
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(id: &str, balance: &str, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: InvoiceId::new(id).unwrap(),
            customer_id: None,
            number: format!("N-{id}"),
            date: NaiveDate::from_ymd_opt(2026, 1, 1),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 31),
            total_amount: Money::parse("300").unwrap(),
            balance: Money::parse(balance).unwrap(),
            status,
        }
    }

    #[test]
    fn candidates_exclude_void_and_settled_invoices() {
        let all = vec![
            invoice("A", "300", InvoiceStatus::Unpaid),
            invoice("B", "0", InvoiceStatus::Paid),
            invoice("C", "120", InvoiceStatus::Void),
            invoice("D", "50", InvoiceStatus::Overdue),
            invoice("E", "-5", InvoiceStatus::Posted),
        ];

        let ids: Vec<_> = open_for_allocation(all)
            .into_iter()
            .map(|i| i.id.to_string())
            .collect();
        assert_eq!(ids, vec!["A", "D"]);
    }

    #[test]
    fn duplicate_ids_keep_first_snapshot() {
        let all = vec![
            invoice("A", "300", InvoiceStatus::Unpaid),
            invoice("B", "50", InvoiceStatus::Overdue),
            invoice("A", "120", InvoiceStatus::Unpaid),
        ];

        let candidates = open_for_allocation(all);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].balance, Money::parse("300").unwrap());
        assert_eq!(candidates[1].id.as_str(), "B");
    }

    #[test]
    fn allocating_full_balance_marks_invoice_paid() {
        let mut inv = invoice("A", "300", InvoiceStatus::Unpaid);
        inv.apply_allocated(Money::parse("100").unwrap()).unwrap();
        assert_eq!(inv.balance, Money::parse("200").unwrap());
        assert_eq!(inv.status, InvoiceStatus::Unpaid);
        assert_eq!(inv.amount_paid(), Money::parse("100").unwrap());

        inv.apply_allocated(Money::parse("200").unwrap()).unwrap();
        assert!(inv.balance.is_zero());
        assert_eq!(inv.status, InvoiceStatus::Paid);
    }

    #[test]
    fn cannot_overpay_invoice() {
        let mut inv = invoice("A", "30", InvoiceStatus::Unpaid);
        let err = inv.apply_allocated(Money::parse("50").unwrap()).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("cannot overpay invoice") => {}
            _ => panic!("Expected InvariantViolation for overpaying invoice"),
        }
        assert_eq!(inv.balance, Money::parse("30").unwrap());
    }

    #[test]
    fn cannot_allocate_to_void_invoice() {
        let mut inv = invoice("A", "30", InvoiceStatus::Void);
        assert!(inv.apply_allocated(Money::parse("10").unwrap()).is_err());
    }

    #[test]
    fn overdue_uses_due_date() {
        let inv = invoice("A", "30", InvoiceStatus::Unpaid);
        let before = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let after = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        assert!(!inv.is_overdue(before));
        assert!(inv.is_overdue(after));
        assert_eq!(inv.days_past_due(after), Some(10));
    }

    #[test]
    fn refreshed_snapshot_keeps_identity() {
        let before = invoice("A", "300", InvoiceStatus::Unpaid);
        let mut after = before.clone();
        after.apply_allocated(Money::parse("300").unwrap()).unwrap();

        assert_ne!(before, after);
        assert!(before.same_identity_as(&after));
        assert!(!before.same_identity_as(&invoice("B", "300", InvoiceStatus::Unpaid)));
    }

    #[test]
    fn status_accepts_backend_casing() {
        let s: InvoiceStatus = serde_json::from_str("\"Void\"").unwrap();
        assert_eq!(s, InvoiceStatus::Void);
        let s: InvoiceStatus = serde_json::from_str("\"overdue\"").unwrap();
        assert_eq!(s, InvoiceStatus::Overdue);
    }
}
