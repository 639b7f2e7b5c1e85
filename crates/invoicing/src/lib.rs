//! Invoicing domain module.
//!
//! Client-side snapshots of invoices and receipts as served by the AR backend,
//! plus the allocation request that moves receipt funds onto invoices. Pure
//! domain logic: no IO, no HTTP.

pub mod invoice;
pub mod receipt;

pub use invoice::{Invoice, InvoiceStatus, open_for_allocation};
pub use receipt::{AllocatedAmount, AllocationRequest, Receipt, ReceiptAllocation, ReceiptStatus};
