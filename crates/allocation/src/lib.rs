//! `receivables-allocation`: the receipt allocation engine.
//!
//! A user distributes a receipt's unallocated funds across a customer's open
//! invoices. The [`AllocationCalculator`] enforces conservation and per-invoice
//! bounds; the [`AllocationSession`] drives one interactive attempt from
//! invoice load to submit or cancel, talking to the backend only through the
//! [`InvoiceBalanceProvider`] and [`AllocationSubmitter`] collaborators.

pub mod calculator;
pub mod collaborator;
pub mod error;
pub mod session;

pub use calculator::AllocationCalculator;
pub use collaborator::{AllocationSubmitter, CollaboratorError, InvoiceBalanceProvider};
pub use error::AllocationError;
pub use session::{AllocationSession, SessionEvent, SessionStatus};

pub use receivables_invoicing::{AllocatedAmount, AllocationRequest};
