//! Customer accounting reports: statements and receivables aging.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod aging;
pub mod statement;

pub use aging::{AgingBucket, AgingBuckets, AgingReport, CustomerAging};
pub use statement::{
    CustomerStatement, EntryKind, StatementEntry, StatementError, StatementLine, StatementPeriod,
};
