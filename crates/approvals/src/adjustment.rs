//! Direct adjustments to a single invoice's balance.

use serde::Serialize;

use receivables_core::{InvoiceId, Money};
use receivables_invoicing::Invoice;

use crate::request::{required_reason, ApprovalError};

/// Credit note against part or all of an invoice's outstanding balance.
///
/// The invoice id travels in the request path, so it is not serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditNoteRequest {
    #[serde(skip)]
    invoice_id: InvoiceId,
    reason: String,
    amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl CreditNoteRequest {
    pub fn for_invoice(
        invoice: &Invoice,
        amount: Money,
        reason: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Self, ApprovalError> {
        if !invoice.can_accept_payment() {
            return Err(ApprovalError::InvoiceNotOpen(invoice.id.clone()));
        }
        if !amount.is_positive() {
            return Err(ApprovalError::NonPositiveAmount(amount));
        }
        if amount > invoice.balance {
            return Err(ApprovalError::ExceedsBalance {
                amount,
                balance: invoice.balance,
            });
        }

        Ok(Self {
            invoice_id: invoice.id.clone(),
            reason: required_reason(reason)?,
            amount,
            notes,
        })
    }

    pub fn invoice_id(&self) -> &InvoiceId {
        &self.invoice_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Write-off of an invoice's whole remaining balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOffRequest {
    #[serde(skip)]
    invoice_id: InvoiceId,
    #[serde(skip)]
    balance: Money,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl WriteOffRequest {
    pub fn for_invoice(
        invoice: &Invoice,
        reason: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Self, ApprovalError> {
        if !invoice.can_accept_payment() {
            return Err(ApprovalError::InvoiceNotOpen(invoice.id.clone()));
        }
        Ok(Self {
            invoice_id: invoice.id.clone(),
            balance: invoice.balance,
            reason: required_reason(reason)?,
            notes,
        })
    }

    pub fn invoice_id(&self) -> &InvoiceId {
        &self.invoice_id
    }

    /// Balance the write-off removes.
    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
