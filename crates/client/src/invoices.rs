use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use receivables_allocation::{CollaboratorError, InvoiceBalanceProvider};
use receivables_approvals::{CreditNoteRequest, WriteOffRequest};
use receivables_core::{CustomerId, InvoiceId, Money};
use receivables_invoicing::{Invoice, InvoiceStatus};

use crate::envelope;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::wire::lenient_date;

const INVOICES: &str = "invoices";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceDto {
    id: InvoiceId,
    #[serde(default)]
    customer_id: Option<CustomerId>,
    #[serde(default, alias = "invoiceNumber")]
    number: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    due_date: Option<NaiveDate>,
    #[serde(alias = "total")]
    total_amount: Money,
    #[serde(alias = "balanceDue")]
    balance: Money,
    status: InvoiceStatus,
}

impl From<InvoiceDto> for Invoice {
    fn from(dto: InvoiceDto) -> Self {
        let number = dto
            .number
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| dto.id.to_string());
        Invoice {
            id: dto.id,
            customer_id: dto.customer_id,
            number,
            date: dto.date,
            due_date: dto.due_date,
            total_amount: dto.total_amount,
            balance: dto.balance,
            status: dto.status,
        }
    }
}

/// Invoice balances read from `GET /invoices?customer_id=`.
#[derive(Debug, Clone)]
pub struct HttpInvoiceProvider {
    api: ApiClient,
}

impl HttpInvoiceProvider {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// All of the customer's invoices in backend order, including void and
    /// settled ones.
    pub async fn list_invoices(&self, customer_id: &CustomerId) -> Result<Vec<Invoice>, ClientError> {
        let body = self
            .api
            .get(INVOICES, &[("customer_id", customer_id.to_string())])
            .await?;
        let dtos: Vec<InvoiceDto> = envelope::decode_list(body)?;
        tracing::debug!(customer_id = %customer_id, count = dtos.len(), "invoices loaded");
        Ok(dtos.into_iter().map(Invoice::from).collect())
    }

    pub async fn issue_credit_note(&self, request: &CreditNoteRequest) -> Result<(), ClientError> {
        tracing::info!(
            invoice_id = %request.invoice_id(),
            amount = %request.amount(),
            "issuing credit note"
        );
        let path = format!("{INVOICES}/credit/{}", request.invoice_id());
        let body = self.api.post(&path, request).await?;
        envelope::open(body)?;
        Ok(())
    }

    pub async fn write_off(&self, request: &WriteOffRequest) -> Result<(), ClientError> {
        tracing::info!(
            invoice_id = %request.invoice_id(),
            balance = %request.balance(),
            "writing off invoice"
        );
        let path = format!("{INVOICES}/writeoff/{}", request.invoice_id());
        let body = self.api.post(&path, request).await?;
        envelope::open(body)?;
        Ok(())
    }
}

#[async_trait]
impl InvoiceBalanceProvider for HttpInvoiceProvider {
    async fn invoices_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Invoice>, CollaboratorError> {
        self.list_invoices(customer_id).await.map_err(CollaboratorError::from)
    }
}
