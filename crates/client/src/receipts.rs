use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use receivables_allocation::{AllocationSubmitter, CollaboratorError};
use receivables_core::{CustomerId, InvoiceId, Money, ReceiptId};
use receivables_invoicing::{AllocationRequest, Receipt, ReceiptAllocation, ReceiptStatus};

use crate::envelope;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::wire::lenient_date;

const RECEIPTS: &str = "receipts";
const ALLOCATE: &str = "receipts/allocate";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptAllocationDto {
    invoice_id: InvoiceId,
    #[serde(default)]
    invoice_number: Option<String>,
    #[serde(alias = "amount")]
    amount_allocated: Money,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptDto {
    id: ReceiptId,
    customer_id: CustomerId,
    #[serde(default, alias = "receiptNumber")]
    number: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    date: Option<NaiveDate>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    reference: Option<String>,
    #[serde(alias = "amount")]
    total_amount: Money,
    unallocated_amount: Money,
    status: ReceiptStatus,
    #[serde(default)]
    allocations: Vec<ReceiptAllocationDto>,
}

impl TryFrom<ReceiptDto> for Receipt {
    type Error = ClientError;

    fn try_from(dto: ReceiptDto) -> Result<Self, Self::Error> {
        let number = dto.number.unwrap_or_else(|| dto.id.to_string());
        let allocations = dto
            .allocations
            .into_iter()
            .map(|a| ReceiptAllocation {
                invoice_id: a.invoice_id,
                invoice_number: a.invoice_number,
                amount_allocated: a.amount_allocated,
            })
            .collect();

        let receipt = Receipt::new(
            dto.id,
            dto.customer_id,
            number,
            dto.total_amount,
            dto.unallocated_amount,
            dto.status,
        )?
        .with_details(dto.date, dto.payment_method, dto.reference)
        .with_allocations(allocations);
        Ok(receipt)
    }
}

/// Invoice line of a payment history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAllocation {
    pub invoice_number: String,
    pub amount: Money,
}

/// A past payment by the customer and the invoices it settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryItem {
    pub id: ReceiptId,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    pub receipt_number: String,
    pub amount: Money,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub invoice_allocations: Vec<HistoryAllocation>,
}

/// Receipt reads and allocation submission.
#[derive(Debug, Clone)]
pub struct HttpReceiptClient {
    api: ApiClient,
}

impl HttpReceiptClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list_receipts(&self, customer_id: &CustomerId) -> Result<Vec<Receipt>, ClientError> {
        let body = self
            .api
            .get(RECEIPTS, &[("customer_id", customer_id.to_string())])
            .await?;
        let dtos: Vec<ReceiptDto> = envelope::decode_list(body)?;
        dtos.into_iter().map(Receipt::try_from).collect()
    }

    /// `Ok(None)` when the backend does not know the receipt.
    pub async fn get_receipt(&self, receipt_id: &ReceiptId) -> Result<Option<Receipt>, ClientError> {
        let path = format!("{RECEIPTS}/{receipt_id}");
        match self.api.get(&path, &[]).await {
            Ok(body) => {
                let dto: Option<ReceiptDto> = envelope::decode(body)?;
                dto.map(Receipt::try_from).transpose()
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn payment_history(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<PaymentHistoryItem>, ClientError> {
        let path = format!("{RECEIPTS}/history/{customer_id}");
        let body = self.api.get(&path, &[]).await?;
        envelope::decode_list(body)
    }

    /// Send an allocation. The backend applies it atomically or not at all.
    pub async fn allocate(&self, request: &AllocationRequest) -> Result<(), ClientError> {
        tracing::info!(
            receipt_id = %request.receipt_id(),
            lines = request.allocations().len(),
            total = %request.total(),
            "submitting allocation"
        );
        let body = self.api.post(ALLOCATE, request).await?;
        envelope::open(body)?;
        Ok(())
    }
}

#[async_trait]
impl AllocationSubmitter for HttpReceiptClient {
    async fn submit_allocation(&self, request: &AllocationRequest) -> Result<(), CollaboratorError> {
        self.allocate(request).await.map_err(CollaboratorError::from)
    }
}
