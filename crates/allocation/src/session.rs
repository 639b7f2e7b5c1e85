//! One interactive allocation attempt, from invoice load to submit or cancel.
//!
//! State transitions are decided by the pure [`SessionStatus::on`] table; the
//! [`AllocationSession`] driver performs the collaborator calls around them.
//!
//! ```text
//! Idle --ReceiptSelected--> LoadingInvoices --InvoicesLoaded--> Editing
//! LoadingInvoices --LoadFailed--> Error --RetryLoad--> LoadingInvoices
//! Editing --AmountChanged--> Editing
//! Editing --SubmitRequested--> Submitting --SubmitSucceeded--> Done
//! Submitting --SubmitFailed--> Editing
//! Idle | LoadingInvoices | Editing | Error --Cancelled--> Idle
//! ```

use receivables_core::{Entity, InvoiceId, Money};
use receivables_invoicing::{AllocationRequest, Invoice, Receipt};

use crate::calculator::AllocationCalculator;
use crate::collaborator::{AllocationSubmitter, CollaboratorError, InvoiceBalanceProvider};
use crate::error::AllocationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Idle,
    LoadingInvoices,
    Editing,
    Submitting,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    ReceiptSelected,
    InvoicesLoaded,
    LoadFailed,
    RetryLoad,
    AmountChanged,
    SubmitRequested,
    SubmitSucceeded,
    SubmitFailed,
    Cancelled,
}

impl SessionStatus {
    /// Next status for `event`, or `InvalidTransition`.
    pub fn on(self, event: SessionEvent) -> Result<SessionStatus, AllocationError> {
        use SessionEvent as E;
        use SessionStatus as S;

        let next = match (self, event) {
            (S::Idle | S::Error, E::ReceiptSelected) => S::LoadingInvoices,
            (S::Error, E::RetryLoad) => S::LoadingInvoices,
            (S::LoadingInvoices, E::InvoicesLoaded) => S::Editing,
            (S::LoadingInvoices, E::LoadFailed) => S::Error,
            (S::Editing, E::AmountChanged) => S::Editing,
            (S::Editing, E::SubmitRequested) => S::Submitting,
            (S::Submitting, E::SubmitSucceeded) => S::Done,
            (S::Submitting, E::SubmitFailed) => S::Editing,
            (S::Idle | S::LoadingInvoices | S::Editing | S::Error, E::Cancelled) => S::Idle,
            (status, event) => return Err(AllocationError::InvalidTransition { event, status }),
        };
        Ok(next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Done)
    }
}

impl core::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::LoadingInvoices => "loading invoices",
            SessionStatus::Editing => "editing",
            SessionStatus::Submitting => "submitting",
            SessionStatus::Done => "done",
            SessionStatus::Error => "in error",
        };
        f.write_str(s)
    }
}

/// Interactive allocation session for a single receipt.
///
/// Operations take `&mut self`, so a submit cannot overlap another submit;
/// the status table additionally rejects `submit` outside `Editing`.
pub struct AllocationSession<P, S> {
    provider: P,
    submitter: S,
    status: SessionStatus,
    receipt: Option<Receipt>,
    calculator: Option<AllocationCalculator>,
    last_error: Option<AllocationError>,
    submitted: Option<AllocationRequest>,
}

impl<P, S> AllocationSession<P, S>
where
    P: InvoiceBalanceProvider,
    S: AllocationSubmitter,
{
    pub fn new(provider: P, submitter: S) -> Self {
        Self {
            provider,
            submitter,
            status: SessionStatus::Idle,
            receipt: None,
            calculator: None,
            last_error: None,
            submitted: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The selected receipt; refreshed optimistically after a successful submit.
    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn calculator(&self) -> Option<&AllocationCalculator> {
        self.calculator.as_ref()
    }

    /// Candidate invoices; empty unless invoices were loaded.
    pub fn candidates(&self) -> &[Invoice] {
        self.calculator
            .as_ref()
            .map(AllocationCalculator::candidates)
            .unwrap_or(&[])
    }

    /// The failure to surface to the user, if any.
    pub fn last_error(&self) -> Option<&AllocationError> {
        self.last_error.as_ref()
    }

    /// The request accepted by the backend once the session is `Done`.
    pub fn submitted_request(&self) -> Option<&AllocationRequest> {
        self.submitted.as_ref()
    }

    fn transition(&mut self, event: SessionEvent) -> Result<(), AllocationError> {
        let next = self.status.on(event)?;
        if next != self.status {
            tracing::info!(from = %self.status, to = %next, ?event, "allocation session transition");
        }
        self.status = next;
        Ok(())
    }

    /// Select the receipt to allocate and load the customer's open invoices.
    pub async fn select_receipt(&mut self, receipt: Receipt) -> Result<(), AllocationError> {
        self.status.on(SessionEvent::ReceiptSelected)?;
        if !receipt.can_allocate() {
            return Err(AllocationError::ReceiptNotAllocatable {
                receipt_id: receipt.id().clone(),
                reason: format!(
                    "status {:?} with {} unallocated",
                    receipt.status(),
                    receipt.unallocated_amount()
                ),
            });
        }

        self.transition(SessionEvent::ReceiptSelected)?;
        self.receipt = Some(receipt);
        self.load_invoices().await
    }

    /// Retry the invoice load after a failure.
    pub async fn retry_load(&mut self) -> Result<(), AllocationError> {
        self.transition(SessionEvent::RetryLoad)?;
        self.load_invoices().await
    }

    async fn load_invoices(&mut self) -> Result<(), AllocationError> {
        self.calculator = None;
        self.last_error = None;

        let Some(receipt) = self.receipt.as_ref() else {
            return Err(AllocationError::InvoiceLoadFailed("no receipt selected".to_string()));
        };

        let loaded = self
            .provider
            .invoices_for_customer(receipt.customer_id())
            .await
            .map_err(|e| AllocationError::InvoiceLoadFailed(e.to_string()))
            .and_then(|invoices| AllocationCalculator::new(receipt, invoices));

        match loaded {
            Ok(calculator) => {
                tracing::info!(
                    receipt_id = %calculator.receipt_id(),
                    candidates = calculator.candidates().len(),
                    unallocated = %calculator.unallocated_amount(),
                    "invoices loaded for allocation"
                );
                self.calculator = Some(calculator);
                self.transition(SessionEvent::InvoicesLoaded)
            }
            Err(err) => {
                tracing::warn!(error = %err, "invoice load failed");
                self.transition(SessionEvent::LoadFailed)?;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn editing_calculator(&mut self) -> Result<&mut AllocationCalculator, AllocationError> {
        self.status.on(SessionEvent::AmountChanged)?;
        self.calculator.as_mut().ok_or(AllocationError::InvalidTransition {
            event: SessionEvent::AmountChanged,
            status: self.status,
        })
    }

    pub fn set_amount(&mut self, invoice_id: &InvoiceId, amount: Money) -> Result<(), AllocationError> {
        self.editing_calculator()?.set_amount(invoice_id, amount)
    }

    pub fn set_amount_input(&mut self, invoice_id: &InvoiceId, raw: &str) -> Result<(), AllocationError> {
        self.editing_calculator()?.set_amount_input(invoice_id, raw)
    }

    /// Validate, then hand the request to the submitter.
    ///
    /// Validation failures keep the session in `Editing`. A backend failure
    /// returns to `Editing` with the entered amounts intact; the caller decides
    /// whether to retry, re-load or cancel.
    pub async fn submit(&mut self) -> Result<AllocationRequest, AllocationError> {
        self.status.on(SessionEvent::SubmitRequested)?;
        let request = match &self.calculator {
            Some(calculator) => calculator.to_request()?,
            None => {
                return Err(AllocationError::InvalidTransition {
                    event: SessionEvent::SubmitRequested,
                    status: self.status,
                });
            }
        };

        self.transition(SessionEvent::SubmitRequested)?;
        self.last_error = None;

        match self.submitter.submit_allocation(&request).await {
            Ok(()) => {
                if let Some(receipt) = self.receipt.as_mut() {
                    if let Err(e) = receipt.apply_allocation(&request) {
                        tracing::warn!(error = %e, "optimistic receipt refresh skipped");
                    }
                }
                tracing::info!(
                    receipt_id = %request.receipt_id(),
                    lines = request.allocations().len(),
                    total = %request.total(),
                    "allocation submitted"
                );
                self.transition(SessionEvent::SubmitSucceeded)?;
                self.submitted = Some(request.clone());
                Ok(request)
            }
            Err(e) => {
                let err = match e {
                    CollaboratorError::Unavailable(msg) => AllocationError::SubmissionFailed(msg),
                    CollaboratorError::Rejected(msg) | CollaboratorError::Conflict(msg) => {
                        AllocationError::SubmissionConflict(msg)
                    }
                };
                tracing::warn!(error = %err, "allocation submission failed");
                self.transition(SessionEvent::SubmitFailed)?;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Abandon the session. Discards all local state; nothing is sent.
    pub fn cancel(&mut self) -> Result<(), AllocationError> {
        self.transition(SessionEvent::Cancelled)?;
        self.receipt = None;
        self.calculator = None;
        self.last_error = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use receivables_core::{CustomerId, ReceiptId};
    use receivables_invoicing::{InvoiceStatus, ReceiptStatus};

    #[derive(Default)]
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<Vec<Invoice>, CollaboratorError>>>,
        calls: Mutex<Vec<CustomerId>>,
    }

    impl ScriptedProvider {
        fn with(responses: Vec<Result<Vec<Invoice>, CollaboratorError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InvoiceBalanceProvider for ScriptedProvider {
        async fn invoices_for_customer(
            &self,
            customer_id: &CustomerId,
        ) -> Result<Vec<Invoice>, CollaboratorError> {
            self.calls.lock().unwrap().push(customer_id.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CollaboratorError::Unavailable("no script".into())))
        }
    }

    #[derive(Default)]
    struct ScriptedSubmitter {
        responses: Mutex<VecDeque<Result<(), CollaboratorError>>>,
        seen: Mutex<Vec<AllocationRequest>>,
    }

    impl ScriptedSubmitter {
        fn with(responses: Vec<Result<(), CollaboratorError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AllocationSubmitter for ScriptedSubmitter {
        async fn submit_allocation(&self, request: &AllocationRequest) -> Result<(), CollaboratorError> {
            self.seen.lock().unwrap().push(request.clone());
            self.responses.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn id(s: &str) -> InvoiceId {
        InvoiceId::new(s).unwrap()
    }

    fn receipt() -> Receipt {
        Receipt::new(
            ReceiptId::new("R-1").unwrap(),
            CustomerId::new("C-1").unwrap(),
            "RCPT-0001",
            money("500"),
            money("500"),
            ReceiptStatus::Unallocated,
        )
        .unwrap()
    }

    fn invoice(inv_id: &str, balance: &str) -> Invoice {
        Invoice {
            id: id(inv_id),
            customer_id: CustomerId::new("C-1").ok(),
            number: format!("INV-{inv_id}"),
            date: None,
            due_date: None,
            total_amount: money(balance),
            balance: money(balance),
            status: InvoiceStatus::Unpaid,
        }
    }

    fn open_invoices() -> Vec<Invoice> {
        vec![invoice("A", "300"), invoice("B", "250")]
    }

    #[test]
    fn transition_table_rejects_out_of_order_events() {
        assert_eq!(
            SessionStatus::Idle.on(SessionEvent::SubmitRequested),
            Err(AllocationError::InvalidTransition {
                event: SessionEvent::SubmitRequested,
                status: SessionStatus::Idle,
            })
        );
        assert!(SessionStatus::Submitting.on(SessionEvent::SubmitRequested).is_err());
        assert!(SessionStatus::Submitting.on(SessionEvent::Cancelled).is_err());
        assert!(SessionStatus::Done.on(SessionEvent::ReceiptSelected).is_err());
        assert_eq!(
            SessionStatus::Submitting.on(SessionEvent::SubmitFailed),
            Ok(SessionStatus::Editing)
        );
        assert!(SessionStatus::Done.is_terminal());
    }

    #[tokio::test]
    async fn happy_path_reaches_done_and_refreshes_receipt() {
        let provider = ScriptedProvider::with(vec![Ok(open_invoices())]);
        let submitter = ScriptedSubmitter::with(vec![Ok(())]);
        let mut session = AllocationSession::new(provider.clone(), submitter.clone());

        session.select_receipt(receipt()).await.unwrap();
        assert_eq!(session.status(), SessionStatus::Editing);
        assert_eq!(session.candidates().len(), 2);
        assert_eq!(provider.calls.lock().unwrap()[0].as_str(), "C-1");

        session.set_amount(&id("A"), money("300")).unwrap();
        session.set_amount_input(&id("B"), "200").unwrap();

        let request = session.submit().await.unwrap();
        assert_eq!(session.status(), SessionStatus::Done);
        assert_eq!(request.total(), money("500"));
        assert_eq!(submitter.seen.lock().unwrap().as_slice(), &[request.clone()]);
        assert_eq!(session.submitted_request(), Some(&request));

        let refreshed = session.receipt().unwrap();
        assert!(refreshed.unallocated_amount().is_zero());
        assert_eq!(refreshed.status(), ReceiptStatus::Allocated);

        assert!(session.set_amount(&id("A"), money("1")).is_err());
        assert!(session.submit().await.is_err());
        assert_eq!(submitter.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_allocation_is_never_submitted() {
        let submitter = ScriptedSubmitter::with(vec![]);
        let mut session = AllocationSession::new(
            ScriptedProvider::with(vec![Ok(open_invoices())]),
            submitter.clone(),
        );
        session.select_receipt(receipt()).await.unwrap();

        session.set_amount(&id("A"), money("300")).unwrap();
        session.set_amount(&id("B"), money("250")).unwrap();
        let err = session.submit().await.unwrap_err();

        assert_eq!(err, AllocationError::OverAllocation { excess: money("50") });
        assert_eq!(session.status(), SessionStatus::Editing);
        assert!(submitter.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_submission_returns_to_editing_with_amounts() {
        let submitter = ScriptedSubmitter::with(vec![
            Err(CollaboratorError::Conflict("invoice A already paid".into())),
            Ok(()),
        ]);
        let mut session = AllocationSession::new(
            ScriptedProvider::with(vec![Ok(open_invoices())]),
            submitter.clone(),
        );
        session.select_receipt(receipt()).await.unwrap();
        session.set_amount(&id("A"), money("120")).unwrap();

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, AllocationError::SubmissionConflict(ref m) if m.contains("already paid")));
        assert_eq!(session.status(), SessionStatus::Editing);
        assert_eq!(session.last_error(), Some(&err));
        assert_eq!(session.calculator().unwrap().amount_for(&id("A")), money("120"));
        assert_eq!(session.receipt().unwrap().unallocated_amount(), money("500"));

        session.submit().await.unwrap();
        assert_eq!(session.status(), SessionStatus::Done);
        assert_eq!(submitter.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_as_submission_failed() {
        let mut session = AllocationSession::new(
            ScriptedProvider::with(vec![Ok(open_invoices())]),
            ScriptedSubmitter::with(vec![Err(CollaboratorError::Unavailable("timeout".into()))]),
        );
        session.select_receipt(receipt()).await.unwrap();
        session.set_amount(&id("B"), money("10")).unwrap();

        let err = session.submit().await.unwrap_err();
        assert_eq!(err, AllocationError::SubmissionFailed("timeout".into()));
        assert_eq!(session.status(), SessionStatus::Editing);
    }

    #[tokio::test]
    async fn load_failure_enters_error_and_retry_recovers() {
        let provider = ScriptedProvider::with(vec![
            Err(CollaboratorError::Unavailable("connection refused".into())),
            Ok(open_invoices()),
        ]);
        let mut session = AllocationSession::new(provider.clone(), ScriptedSubmitter::with(vec![]));

        let err = session.select_receipt(receipt()).await.unwrap_err();
        assert!(matches!(err, AllocationError::InvoiceLoadFailed(_)));
        assert_eq!(session.status(), SessionStatus::Error);
        assert!(session.candidates().is_empty());
        assert!(session.set_amount(&id("A"), money("1")).is_err());

        session.retry_load().await.unwrap();
        assert_eq!(session.status(), SessionStatus::Editing);
        assert_eq!(session.candidates().len(), 2);
        assert!(session.last_error().is_none());
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cancel_discards_state_without_side_effects() {
        let submitter = ScriptedSubmitter::with(vec![]);
        let mut session = AllocationSession::new(
            ScriptedProvider::with(vec![Ok(open_invoices())]),
            submitter.clone(),
        );
        session.select_receipt(receipt()).await.unwrap();
        session.set_amount(&id("A"), money("100")).unwrap();

        session.cancel().unwrap();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.receipt().is_none());
        assert!(session.calculator().is_none());
        assert!(submitter.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn void_receipt_is_not_selectable() {
        let void = Receipt::new(
            ReceiptId::new("R-9").unwrap(),
            CustomerId::new("C-1").unwrap(),
            "RCPT-0009",
            money("50"),
            money("50"),
            ReceiptStatus::Void,
        )
        .unwrap();
        let provider = ScriptedProvider::with(vec![]);
        let mut session = AllocationSession::new(provider.clone(), ScriptedSubmitter::with(vec![]));

        let err = session.select_receipt(void).await.unwrap_err();
        assert!(matches!(err, AllocationError::ReceiptNotAllocatable { .. }));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(provider.calls.lock().unwrap().is_empty());
    }
}
