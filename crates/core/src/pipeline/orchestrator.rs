use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditAction, AuditLog, AuditRecord};
use crate::chaos::{ChaosController, ChaosSnapshot, Fault};
use crate::cost::CostTracker;
use crate::domain::classification::ClassificationResult;
use crate::domain::message::{Message, SessionId};
use crate::domain::response::Response;
use crate::errors::{HandlerError, ProcessError};
use crate::handlers::{HandlerContext, HandlerOutput, HandlerRegistry};
use crate::model::{LanguageModel, ModelGateway};
use crate::pipeline::states::PipelineStage;
use crate::policy::PolicyService;
use crate::tickets::TicketStore;

pub const DEFAULT_MODEL_DEADLINE: Duration = Duration::from_secs(30);

/// Top-level coordinator. Sequences classification, routing, and handling for
/// one message at a time, consulting the chaos configuration at every stage
/// and writing one audit entry per transition. `process` never surfaces a raw
/// error: every failure ends in a graceful degraded response.
pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    tickets: Arc<dyn TicketStore>,
    policies: Arc<PolicyService>,
    audit: Arc<dyn AuditLog>,
    cost: Arc<CostTracker>,
    chaos: Arc<ChaosController>,
    registry: HandlerRegistry,
    model_deadline: Duration,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        tickets: Arc<dyn TicketStore>,
        policies: Arc<PolicyService>,
        audit: Arc<dyn AuditLog>,
        cost: Arc<CostTracker>,
        chaos: Arc<ChaosController>,
    ) -> Self {
        Self {
            model,
            tickets,
            policies,
            audit,
            cost,
            chaos,
            registry: HandlerRegistry::new(),
            model_deadline: DEFAULT_MODEL_DEADLINE,
        }
    }

    pub fn with_model_deadline(mut self, deadline: Duration) -> Self {
        self.model_deadline = deadline;
        self
    }

    pub fn chaos(&self) -> &ChaosController {
        &self.chaos
    }

    pub fn cost(&self) -> &CostTracker {
        &self.cost
    }

    pub fn audit(&self) -> &dyn AuditLog {
        self.audit.as_ref()
    }

    /// Processes one message to a final response. Success and failure both
    /// return a well-formed `Response`; the failure reason lives only in the
    /// audit trail.
    pub async fn process(&self, message: &Message, session_id: &SessionId) -> Response {
        // One snapshot per call. Administrative fault flips mid-flight do not
        // change this message's behavior.
        let chaos = self.chaos.snapshot();

        self.record(
            session_id,
            "orchestrator",
            AuditAction::Receive,
            format!("message {} received ({} chars)", message.id.0, message.text.len()),
        );

        match self.run(message, session_id, &chaos).await {
            Ok(output) => {
                let session_cost = self.cost.snapshot().session_total_cost;
                self.record(
                    session_id,
                    "orchestrator",
                    AuditAction::Complete,
                    format!("session cost total {session_cost}"),
                );
                tracing::info!(
                    event_name = "pipeline.completed",
                    session_id = %session_id.0,
                    message_id = %message.id.0,
                    ticket_id = output.ticket_id.as_ref().map(|id| id.0.as_str()),
                    "message processed"
                );
                Response::success(
                    output.text,
                    output.cited_policy_ids,
                    output.ticket_id,
                    session_cost,
                )
            }
            Err((stage, error)) => {
                self.record(
                    session_id,
                    "orchestrator",
                    AuditAction::Fail,
                    format!("stage={stage} kind={} {error}", error.kind()),
                );
                tracing::warn!(
                    event_name = "pipeline.failed",
                    session_id = %session_id.0,
                    message_id = %message.id.0,
                    stage = stage.as_str(),
                    kind = error.kind(),
                    error = %error,
                    "message processing degraded"
                );
                Response::degraded(self.cost.snapshot().session_total_cost)
            }
        }
    }

    async fn run(
        &self,
        message: &Message,
        session_id: &SessionId,
        chaos: &ChaosSnapshot,
    ) -> Result<HandlerOutput, (PipelineStage, ProcessError)> {
        let gateway = ModelGateway::new(self.model.as_ref(), &self.cost, chaos, self.model_deadline);

        let classification = self
            .classify(message, chaos, &gateway)
            .await
            .map_err(|error| (PipelineStage::Received, error))?;
        self.record(
            session_id,
            "classifier",
            AuditAction::Classify,
            format!(
                "label={} confidence={:.2}",
                classification.label.as_str(),
                classification.confidence
            ),
        );

        let handler = self
            .route(&classification, chaos)
            .map_err(|error| (PipelineStage::Classified, error))?;
        self.record(
            session_id,
            "router",
            AuditAction::Route,
            format!("selected {}", handler.name()),
        );

        let ctx = HandlerContext {
            policies: &self.policies,
            tickets: self.tickets.as_ref(),
            model: &gateway,
            chaos,
        };
        let output = handler
            .handle(message, &classification, &ctx)
            .await
            .map_err(|error| (PipelineStage::Routed, error))?;
        self.record(
            session_id,
            handler.name(),
            AuditAction::Handle,
            format!(
                "ticket={} citations={}",
                output.ticket_id.as_ref().map_or("none", |id| id.0.as_str()),
                output.cited_policy_ids.len()
            ),
        );

        Ok(output)
    }

    async fn classify(
        &self,
        message: &Message,
        chaos: &ChaosSnapshot,
        gateway: &ModelGateway<'_>,
    ) -> Result<ClassificationResult, ProcessError> {
        if let Err(injected) = chaos.check(Fault::ClassifierFailure) {
            return Err(ProcessError::Classification(injected.to_string()));
        }

        let raw = gateway.classify(&message.text).await.map_err(|error| match error {
            // Deadline and injected timeouts keep their own kind; everything
            // else from the classifier is a classification failure.
            HandlerError::Timeout(detail) => ProcessError::Handler(HandlerError::Timeout(detail)),
            other => ProcessError::Classification(other.to_string()),
        })?;
        Ok(ClassificationResult::new(raw.label, raw.confidence))
    }

    fn route(
        &self,
        classification: &ClassificationResult,
        chaos: &ChaosSnapshot,
    ) -> Result<&dyn crate::handlers::Handler, ProcessError> {
        if let Err(injected) = chaos.check(Fault::RouterFailure) {
            return Err(ProcessError::Routing(injected.to_string()));
        }
        Ok(self.registry.select(classification.label))
    }

    fn record(
        &self,
        session_id: &SessionId,
        component: &str,
        action: AuditAction,
        detail: String,
    ) {
        self.audit.append(AuditRecord::new(session_id.clone(), component, action, detail));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::Orchestrator;
    use crate::audit::{AuditAction, AuditLog, InMemoryAuditLog};
    use crate::chaos::{ChaosController, Fault};
    use crate::cost::CostTracker;
    use crate::domain::classification::MessageLabel;
    use crate::domain::message::{Message, SessionId};
    use crate::domain::ticket::{Ticket, TicketId, TicketPriority, TicketStatus};
    use crate::errors::GENERIC_FAILURE_TEXT;
    use crate::pipeline::testing::ScriptedModel;
    use crate::policy::PolicyService;
    use crate::tickets::InMemoryTicketStore;

    struct Harness {
        orchestrator: Orchestrator,
        tickets: Arc<InMemoryTicketStore>,
        audit: Arc<InMemoryAuditLog>,
        cost: Arc<CostTracker>,
        chaos: Arc<ChaosController>,
    }

    fn harness(model: ScriptedModel) -> Harness {
        let tickets = Arc::new(InMemoryTicketStore::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let cost = Arc::new(CostTracker::default());
        let chaos = Arc::new(ChaosController::new());
        let orchestrator = Orchestrator::new(
            Arc::new(model),
            Arc::clone(&tickets) as _,
            Arc::new(PolicyService::builtin()),
            Arc::clone(&audit) as _,
            Arc::clone(&cost),
            Arc::clone(&chaos),
        );
        Harness { orchestrator, tickets, audit, cost, chaos }
    }

    fn session() -> SessionId {
        SessionId("session-under-test".to_owned())
    }

    fn actions(audit: &InMemoryAuditLog, session_id: &SessionId) -> Vec<AuditAction> {
        audit.entries_for_session(session_id).iter().map(|entry| entry.action).collect()
    }

    #[tokio::test]
    async fn positive_feedback_is_acknowledged_without_side_effects() {
        let harness = harness(ScriptedModel::new(MessageLabel::Positive, 0.95));
        let session_id = session();

        let response = harness
            .orchestrator
            .process(&Message::new("Thank you so much for your help!"), &session_id)
            .await;

        assert!(response.ticket_id.is_none());
        assert!(response.cited_policy_ids.is_empty());
        assert_ne!(response.text, GENERIC_FAILURE_TEXT);
        assert!(response.session_cost > Decimal::ZERO);
        assert_eq!(
            actions(&harness.audit, &session_id),
            vec![
                AuditAction::Receive,
                AuditAction::Classify,
                AuditAction::Route,
                AuditAction::Handle,
                AuditAction::Complete,
            ]
        );
        assert!(harness.audit.verify_session(&session_id).valid);
    }

    #[tokio::test]
    async fn confident_complaint_creates_a_priority_one_ticket_with_citations() {
        let harness = harness(ScriptedModel::new(MessageLabel::Negative, 0.92));
        let session_id = session();

        let response = harness
            .orchestrator
            .process(&Message::new("My card was stolen yesterday and I'm furious"), &session_id)
            .await;

        let ticket_id = response.ticket_id.expect("ticket created");
        let ticket = harness.tickets.get(&ticket_id).await.expect("stored");
        assert_eq!(ticket.priority, TicketPriority::Critical);
        assert!(response.cited_policy_ids.contains(&"POLICY-002".to_owned()));
    }

    #[tokio::test]
    async fn status_query_reports_the_seeded_ticket_without_creating_one() {
        let harness = harness(ScriptedModel::new(MessageLabel::Query, 0.9));
        harness
            .tickets
            .insert(Ticket {
                id: TicketId("T-123".to_owned()),
                status: TicketStatus::InProgress,
                priority: TicketPriority::High,
                summary: "billing dispute".to_owned(),
                created_at: chrono::Utc::now(),
            })
            .await;
        let session_id = session();

        let response = harness
            .orchestrator
            .process(&Message::new("What's the status of ticket T-123?"), &session_id)
            .await;

        assert!(response.text.contains("in_progress"));
        assert_eq!(response.ticket_id, Some(TicketId("T-123".to_owned())));
        assert_eq!(harness.tickets.count().await, 1, "query must not create tickets");
    }

    #[tokio::test]
    async fn classifier_fault_degrades_without_charging_tokens() {
        let harness = harness(ScriptedModel::new(MessageLabel::Positive, 0.95));
        harness.chaos.set_fault(Fault::ClassifierFailure, true);
        let session_id = session();

        let response =
            harness.orchestrator.process(&Message::new("any input at all"), &session_id).await;

        assert_eq!(response.text, GENERIC_FAILURE_TEXT);
        assert_eq!(response.session_cost, Decimal::ZERO);
        assert_eq!(harness.cost.snapshot().call_count, 0);

        let entries = harness.audit.entries_for_session(&session_id);
        assert_eq!(
            actions(&harness.audit, &session_id),
            vec![AuditAction::Receive, AuditAction::Fail]
        );
        assert!(entries.last().expect("fail entry").detail.contains("classifier_failure"));
    }

    #[tokio::test]
    async fn router_fault_logs_classification_but_not_routing() {
        let harness = harness(ScriptedModel::new(MessageLabel::Query, 0.8));
        harness.chaos.set_fault(Fault::RouterFailure, true);
        let session_id = session();

        let response =
            harness.orchestrator.process(&Message::new("Where is T-55?"), &session_id).await;

        assert_eq!(response.text, GENERIC_FAILURE_TEXT);
        assert_eq!(
            actions(&harness.audit, &session_id),
            vec![AuditAction::Receive, AuditAction::Classify, AuditAction::Fail]
        );
        let entries = harness.audit.entries_for_session(&session_id);
        assert!(entries.last().expect("fail entry").detail.contains("router_failure"));
    }

    #[tokio::test]
    async fn database_fault_on_a_complaint_creates_nothing_but_still_charges_the_classify() {
        let harness = harness(ScriptedModel::new(MessageLabel::Negative, 0.9));
        harness.chaos.set_fault(Fault::DatabaseError, true);
        let session_id = session();

        let response = harness
            .orchestrator
            .process(&Message::new("These overdraft fees are absurd"), &session_id)
            .await;

        assert_eq!(response.text, GENERIC_FAILURE_TEXT);
        assert_eq!(harness.tickets.count().await, 0);
        // The classify call consumed tokens before the handler failed.
        assert!(response.session_cost > Decimal::ZERO);
        let entries = harness.audit.entries_for_session(&session_id);
        assert!(entries.last().expect("fail entry").detail.contains("database_error"));
    }

    #[tokio::test]
    async fn timeout_fault_degrades_any_stage_that_calls_the_model() {
        let harness = harness(ScriptedModel::new(MessageLabel::Positive, 0.95));
        harness.chaos.set_fault(Fault::Timeout, true);
        let session_id = session();

        let response =
            harness.orchestrator.process(&Message::new("Great service"), &session_id).await;

        assert_eq!(response.text, GENERIC_FAILURE_TEXT);
        let entries = harness.audit.entries_for_session(&session_id);
        assert!(entries.last().expect("fail entry").detail.contains("timeout"));
    }

    #[tokio::test]
    async fn identical_input_and_faults_yield_identical_response_structure() {
        let session_id = session();
        let mut shapes = Vec::new();
        for _ in 0..2 {
            let harness = harness(ScriptedModel::new(MessageLabel::Negative, 0.92));
            let response = harness
                .orchestrator
                .process(&Message::new("My card was lost yesterday"), &session_id)
                .await;
            shapes.push((
                response.text,
                response.cited_policy_ids,
                response.ticket_id.is_some(),
            ));
        }
        assert_eq!(shapes[0], shapes[1]);
    }
}
