//! Allocation error taxonomy.

use thiserror::Error;

use receivables_core::{DomainError, InvoiceId, Money, ReceiptId};

use crate::session::{SessionEvent, SessionStatus};

/// Failures of the allocation engine.
///
/// Validation kinds (`InvalidAmount` through `EmptyAllocation`) are local and
/// synchronous; they gate `to_request()` and submission but never tear a
/// session down.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Non-numeric, negative or over-precise input; never stored.
    #[error("invalid amount for invoice {invoice_id}: {reason}")]
    InvalidAmount { invoice_id: InvoiceId, reason: String },

    /// The invoice is not among the session's candidates.
    #[error("invoice {0} is not open for allocation")]
    UnknownInvoice(InvoiceId),

    /// Lines add up to more than the receipt's unallocated amount.
    #[error("allocations exceed available funds by {excess}")]
    OverAllocation { excess: Money },

    /// A single line exceeds the invoice's own outstanding balance.
    #[error("allocation of {amount} to invoice {invoice_id} exceeds its balance of {balance}")]
    PerLineExceedsBalance {
        invoice_id: InvoiceId,
        amount: Money,
        balance: Money,
    },

    /// Nothing has been allocated.
    #[error("no amount has been allocated")]
    EmptyAllocation,

    #[error("receipt {receipt_id} cannot be allocated: {reason}")]
    ReceiptNotAllocatable { receipt_id: ReceiptId, reason: String },

    #[error("failed to load invoices: {0}")]
    InvoiceLoadFailed(String),

    /// The backend rejected the request (e.g. an invoice was paid meanwhile).
    #[error("allocation rejected by backend: {0}")]
    SubmissionConflict(String),

    /// The request never reached a verdict (transport failure, timeout).
    #[error("allocation submission failed: {0}")]
    SubmissionFailed(String),

    #[error("cannot handle {event:?} while {status}")]
    InvalidTransition {
        event: SessionEvent,
        status: SessionStatus,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AllocationError {
    /// True for the kinds that describe the entered amounts rather than the
    /// session or the backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AllocationError::InvalidAmount { .. }
                | AllocationError::UnknownInvoice(_)
                | AllocationError::OverAllocation { .. }
                | AllocationError::PerLineExceedsBalance { .. }
                | AllocationError::EmptyAllocation
        )
    }
}
