//! Refund and discount approval workflows, plus direct invoice adjustments.
//!
//! Requests are validated locally before they are sent for approval; an
//! approver then approves or rejects each pending request exactly once.
//! Credit notes and write-offs are posted straight against an invoice.

pub mod adjustment;
pub mod request;
pub mod workflow;

pub use adjustment::{CreditNoteRequest, WriteOffRequest};
pub use request::{ApprovalError, DiscountKind, DiscountRequest, RefundRequest};
pub use workflow::{WorkflowAction, WorkflowActionRequest, WorkflowApproval, WorkflowKind, WorkflowStatus};
