use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use receivables_core::{
    CustomerId, DomainError, DomainResult, Entity, InvoiceId, Money, ReceiptId, ValueObject,
};

/// Receipt status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptStatus {
    #[serde(alias = "unallocated")]
    Unallocated,
    #[serde(alias = "allocated")]
    Allocated,
    #[serde(alias = "void")]
    Void,
}

/// A past allocation recorded against a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAllocation {
    pub invoice_id: InvoiceId,
    pub invoice_number: Option<String>,
    pub amount_allocated: Money,
}

/// A recorded customer payment.
///
/// Invariant: `0 <= unallocated_amount <= total_amount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    id: ReceiptId,
    customer_id: CustomerId,
    number: String,
    date: Option<NaiveDate>,
    payment_method: Option<String>,
    reference: Option<String>,
    total_amount: Money,
    unallocated_amount: Money,
    status: ReceiptStatus,
    allocations: Vec<ReceiptAllocation>,
}

impl Receipt {
    pub fn new(
        id: ReceiptId,
        customer_id: CustomerId,
        number: impl Into<String>,
        total_amount: Money,
        unallocated_amount: Money,
        status: ReceiptStatus,
    ) -> DomainResult<Self> {
        if total_amount.is_negative() {
            return Err(DomainError::invalid_amount("receipt total must not be negative"));
        }
        if unallocated_amount.is_negative() {
            return Err(DomainError::invariant("unallocated amount must not be negative"));
        }
        if unallocated_amount > total_amount {
            return Err(DomainError::invariant(
                "unallocated amount cannot exceed receipt total",
            ));
        }

        Ok(Self {
            id,
            customer_id,
            number: number.into(),
            date: None,
            payment_method: None,
            reference: None,
            total_amount,
            unallocated_amount,
            status,
            allocations: Vec::new(),
        })
    }

    pub fn with_details(
        mut self,
        date: Option<NaiveDate>,
        payment_method: Option<String>,
        reference: Option<String>,
    ) -> Self {
        self.date = date;
        self.payment_method = payment_method;
        self.reference = reference;
        self
    }

    pub fn with_allocations(mut self, allocations: Vec<ReceiptAllocation>) -> Self {
        self.allocations = allocations;
        self
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn unallocated_amount(&self) -> Money {
        self.unallocated_amount
    }

    pub fn allocated_amount(&self) -> Money {
        self.total_amount - self.unallocated_amount
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    pub fn allocations(&self) -> &[ReceiptAllocation] {
        &self.allocations
    }

    /// A receipt can start an allocation session only while it has funds left
    /// and has not been voided.
    pub fn can_allocate(&self) -> bool {
        self.status != ReceiptStatus::Void && self.unallocated_amount.is_positive()
    }

    /// Optimistic refresh after the backend accepted `request`.
    pub fn apply_allocation(&mut self, request: &AllocationRequest) -> DomainResult<()> {
        if self.status == ReceiptStatus::Void {
            return Err(DomainError::conflict("receipt is void"));
        }
        if request.receipt_id() != &self.id {
            return Err(DomainError::invariant("receipt_id mismatch"));
        }

        let total = request.total();
        if total > self.unallocated_amount {
            return Err(DomainError::invariant(
                "allocation exceeds unallocated amount",
            ));
        }

        self.unallocated_amount -= total;
        self.allocations
            .extend(request.allocations().iter().map(|line| ReceiptAllocation {
                invoice_id: line.invoice_id.clone(),
                invoice_number: None,
                amount_allocated: line.amount,
            }));
        self.status = if self.unallocated_amount.is_zero() {
            ReceiptStatus::Allocated
        } else {
            ReceiptStatus::Unallocated
        };
        Ok(())
    }
}

impl Entity for Receipt {
    type Id = ReceiptId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One `{invoice, amount}` pair of an allocation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedAmount {
    pub invoice_id: InvoiceId,
    pub amount: Money,
}

impl ValueObject for AllocatedAmount {}

/// Validated request to move receipt funds onto invoices.
///
/// Every amount is positive, each invoice appears once, and the list is never
/// empty. Serialized as `{"receiptId": .., "allocations": [{"invoiceId", "amount"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    receipt_id: ReceiptId,
    allocations: Vec<AllocatedAmount>,
}

impl ValueObject for AllocationRequest {}

impl AllocationRequest {
    pub fn new(receipt_id: ReceiptId, allocations: Vec<AllocatedAmount>) -> DomainResult<Self> {
        if allocations.is_empty() {
            return Err(DomainError::validation(
                "allocation request must have at least one line",
            ));
        }

        let mut seen = HashSet::new();
        for line in &allocations {
            if !line.amount.is_positive() {
                return Err(DomainError::validation("allocation amounts must be positive"));
            }
            if !seen.insert(&line.invoice_id) {
                return Err(DomainError::validation(format!(
                    "invoice {} allocated more than once",
                    line.invoice_id
                )));
            }
        }

        Ok(Self {
            receipt_id,
            allocations,
        })
    }

    pub fn receipt_id(&self) -> &ReceiptId {
        &self.receipt_id
    }

    pub fn allocations(&self) -> &[AllocatedAmount] {
        &self.allocations
    }

    pub fn total(&self) -> Money {
        self.allocations.iter().map(|l| l.amount).sum()
    }
}
