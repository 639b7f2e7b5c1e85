//! `receivables-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the receivables
//! crates: identifiers, currency amounts and the domain error model. No IO.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, InvoiceId, ReceiptId, WorkflowRequestId};
pub use money::{Money, CURRENCY_SCALE};
pub use value_object::ValueObject;
