//! Seams to the backend: invoice balances in, allocation requests out.
//!
//! The engine never retries through these traits; a failure is reported to
//! the session, which decides the next state.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use receivables_core::CustomerId;
use receivables_invoicing::{AllocationRequest, Invoice};

/// Failure reported by a collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The backend could not be reached or did not answer in time.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered but refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The request was based on stale balances.
    #[error("stale state: {0}")]
    Conflict(String),
}

/// Source of a customer's invoices with current balances, in display order.
#[async_trait]
pub trait InvoiceBalanceProvider: Send + Sync {
    async fn invoices_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Invoice>, CollaboratorError>;
}

/// Sink for validated allocation requests. All-or-nothing.
#[async_trait]
pub trait AllocationSubmitter: Send + Sync {
    async fn submit_allocation(&self, request: &AllocationRequest) -> Result<(), CollaboratorError>;
}

#[async_trait]
impl<T: InvoiceBalanceProvider + ?Sized> InvoiceBalanceProvider for Arc<T> {
    async fn invoices_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Invoice>, CollaboratorError> {
        (**self).invoices_for_customer(customer_id).await
    }
}

#[async_trait]
impl<T: AllocationSubmitter + ?Sized> AllocationSubmitter for Arc<T> {
    async fn submit_allocation(&self, request: &AllocationRequest) -> Result<(), CollaboratorError> {
        (**self).submit_allocation(request).await
    }
}
