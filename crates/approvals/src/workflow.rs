use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use receivables_core::{CustomerId, Entity, InvoiceId, Money, WorkflowRequestId};

use crate::request::ApprovalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    #[serde(alias = "Refund")]
    Refund,
    #[serde(alias = "Discount")]
    Discount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Approved")]
    Approved,
    #[serde(alias = "Rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowAction {
    Approve,
    Reject,
}

impl WorkflowAction {
    fn outcome(self) -> WorkflowStatus {
        match self {
            WorkflowAction::Approve => WorkflowStatus::Approved,
            WorkflowAction::Reject => WorkflowStatus::Rejected,
        }
    }
}

/// Body sent when an approver acts on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowActionRequest {
    pub action: WorkflowAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A refund or discount awaiting (or past) approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowApproval {
    pub id: WorkflowRequestId,
    #[serde(rename = "type", alias = "kind")]
    pub kind: WorkflowKind,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub invoice_id: InvoiceId,
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub amount: Money,
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub requested_by: Option<String>,
    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl WorkflowApproval {
    pub fn is_pending(&self) -> bool {
        self.status == WorkflowStatus::Pending
    }

    /// Record an approver's decision. A request is decided once.
    pub fn decide(
        &mut self,
        action: WorkflowAction,
        reviewer: impl Into<String>,
        at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<WorkflowActionRequest, ApprovalError> {
        if !self.is_pending() {
            return Err(ApprovalError::AlreadyDecided {
                id: self.id.clone(),
                status: self.status,
            });
        }

        self.status = action.outcome();
        self.reviewed_by = Some(reviewer.into());
        self.reviewed_at = Some(at);

        Ok(WorkflowActionRequest { action, notes })
    }
}

impl Entity for WorkflowApproval {
    type Id = WorkflowRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
