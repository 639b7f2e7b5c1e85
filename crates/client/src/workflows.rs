use receivables_approvals::{
    DiscountRequest, RefundRequest, WorkflowAction, WorkflowActionRequest, WorkflowApproval,
};
use receivables_core::WorkflowRequestId;

use crate::envelope;
use crate::error::ClientError;
use crate::http::ApiClient;

/// Refund and discount approval requests.
#[derive(Debug, Clone)]
pub struct HttpWorkflowClient {
    api: ApiClient,
}

impl HttpWorkflowClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn submit_refund(&self, request: &RefundRequest) -> Result<(), ClientError> {
        tracing::info!(invoice_id = %request.invoice_id(), amount = %request.amount(), "submitting refund request");
        let body = self.api.post("workflows/refund", request).await?;
        envelope::open(body)?;
        Ok(())
    }

    pub async fn submit_discount(&self, request: &DiscountRequest) -> Result<(), ClientError> {
        tracing::info!(
            invoice_id = %request.invoice_id(),
            amount = %request.discount_amount(),
            "submitting discount request"
        );
        let body = self.api.post("workflows/discount", request).await?;
        envelope::open(body)?;
        Ok(())
    }

    pub async fn pending_approvals(&self) -> Result<Vec<WorkflowApproval>, ClientError> {
        let body = self.api.get("workflows/pending", &[]).await?;
        envelope::decode_list(body)
    }

    /// Send an approver's decision for a request.
    pub async fn act(
        &self,
        request_id: &WorkflowRequestId,
        action: WorkflowAction,
        notes: Option<String>,
    ) -> Result<(), ClientError> {
        self.send_action(request_id, &WorkflowActionRequest { action, notes }).await
    }

    /// Decide a pending approval locally, then send the decision.
    ///
    /// The local copy is only updated if the backend accepts the decision.
    pub async fn decide(
        &self,
        approval: &mut WorkflowApproval,
        action: WorkflowAction,
        reviewer: impl Into<String>,
        notes: Option<String>,
    ) -> Result<(), ClientError> {
        let mut decided = approval.clone();
        let body = decided
            .decide(action, reviewer, chrono::Utc::now(), notes)
            .map_err(|e| ClientError::Rejected(e.to_string()))?;
        self.send_action(&approval.id, &body).await?;
        *approval = decided;
        Ok(())
    }

    async fn send_action(
        &self,
        request_id: &WorkflowRequestId,
        body: &WorkflowActionRequest,
    ) -> Result<(), ClientError> {
        tracing::info!(%request_id, action = ?body.action, "sending workflow decision");
        let path = format!("workflows/action/{request_id}");
        let resp = self.api.post(&path, body).await?;
        envelope::open(resp)?;
        Ok(())
    }
}
