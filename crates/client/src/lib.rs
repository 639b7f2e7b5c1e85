//! `receivables-client`: REST collaborators for the receivables backend.
//!
//! [`HttpInvoiceProvider`] and [`HttpReceiptClient`] implement the allocation
//! engine's collaborator traits; the workflow and report clients cover
//! approvals, aging and statements. No request is ever retried.

pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod invoices;
pub mod receipts;
pub mod reports;
pub mod workflows;
mod wire;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::ApiClient;
pub use invoices::HttpInvoiceProvider;
pub use receipts::{HistoryAllocation, HttpReceiptClient, PaymentHistoryItem};
pub use reports::HttpReportClient;
pub use workflows::HttpWorkflowClient;

/// All endpoint clients over one shared connection pool.
#[derive(Debug, Clone)]
pub struct ReceivablesClient {
    pub invoices: HttpInvoiceProvider,
    pub receipts: HttpReceiptClient,
    pub workflows: HttpWorkflowClient,
    pub reports: HttpReportClient,
}

impl ReceivablesClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let api = ApiClient::new(config)?;
        Ok(Self {
            invoices: HttpInvoiceProvider::new(api.clone()),
            receipts: HttpReceiptClient::new(api.clone()),
            workflows: HttpWorkflowClient::new(api.clone()),
            reports: HttpReportClient::new(api),
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env()?;
        Ok(Self::new(config)?)
    }
}
