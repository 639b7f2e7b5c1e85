use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use receivables_core::{CustomerId, InvoiceId, Money, WorkflowRequestId};
use receivables_invoicing::Invoice;

use crate::workflow::WorkflowStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("a reason is required")]
    MissingReason,

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    #[error("discount percentage must be within (0, 100], got {0}")]
    PercentageOutOfRange(Decimal),

    #[error("discount of {amount} exceeds invoice balance of {balance}")]
    ExceedsBalance { amount: Money, balance: Money },

    #[error("invoice {0} is void or already settled")]
    InvoiceNotOpen(InvoiceId),

    #[error("request {id} was already {status:?}")]
    AlreadyDecided {
        id: WorkflowRequestId,
        status: WorkflowStatus,
    },
}

pub(crate) fn required_reason(reason: impl Into<String>) -> Result<String, ApprovalError> {
    let reason = reason.into();
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(ApprovalError::MissingReason);
    }
    Ok(trimmed.to_string())
}

/// Request to refund part of a customer's payment against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    customer_id: CustomerId,
    invoice_id: InvoiceId,
    amount: Money,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl RefundRequest {
    pub fn new(
        customer_id: CustomerId,
        invoice_id: InvoiceId,
        amount: Money,
        reason: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Self, ApprovalError> {
        if !amount.is_positive() {
            return Err(ApprovalError::NonPositiveAmount(amount));
        }
        Ok(Self {
            customer_id,
            invoice_id,
            amount,
            reason: required_reason(reason)?,
            notes,
        })
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
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

/// How a discount is expressed by the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountKind {
    /// Percentage of the invoice's outstanding balance.
    Percentage(Decimal),
    Fixed(Money),
}

/// Request to discount an invoice's outstanding balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequest {
    customer_id: CustomerId,
    invoice_id: InvoiceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    discount_percentage: Option<Decimal>,
    discount_amount: Money,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(skip)]
    balance: Money,
}

impl DiscountRequest {
    /// Compute and validate a discount against the invoice's current balance.
    pub fn for_invoice(
        customer_id: CustomerId,
        invoice: &Invoice,
        kind: DiscountKind,
        reason: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Self, ApprovalError> {
        if !invoice.can_accept_payment() {
            return Err(ApprovalError::InvoiceNotOpen(invoice.id.clone()));
        }

        let (discount_percentage, discount_amount) = match kind {
            DiscountKind::Percentage(p) => {
                if p <= Decimal::ZERO || p > Decimal::ONE_HUNDRED {
                    return Err(ApprovalError::PercentageOutOfRange(p));
                }
                (Some(p), invoice.balance.percent(p))
            }
            DiscountKind::Fixed(amount) => (None, amount),
        };

        if !discount_amount.is_positive() {
            return Err(ApprovalError::NonPositiveAmount(discount_amount));
        }
        if discount_amount > invoice.balance {
            return Err(ApprovalError::ExceedsBalance {
                amount: discount_amount,
                balance: invoice.balance,
            });
        }

        Ok(Self {
            customer_id,
            invoice_id: invoice.id.clone(),
            discount_percentage,
            discount_amount,
            reason: required_reason(reason)?,
            notes,
            balance: invoice.balance,
        })
    }

    pub fn invoice_id(&self) -> &InvoiceId {
        &self.invoice_id
    }

    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    /// Invoice balance if the discount is approved.
    pub fn new_balance(&self) -> Money {
        self.balance - self.discount_amount
    }
}
