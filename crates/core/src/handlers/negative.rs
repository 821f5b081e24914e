use async_trait::async_trait;

use super::{Handler, HandlerContext, HandlerOutput};
use crate::chaos::Fault;
use crate::domain::classification::ClassificationResult;
use crate::domain::message::Message;
use crate::domain::ticket::{NewTicket, TicketPriority};
use crate::errors::{HandlerError, ProcessError};

/// Confidence at or above this escalates the complaint ticket to priority 1.
/// Regression contract: do not change without flagging.
pub const CRITICAL_CONFIDENCE_THRESHOLD: f64 = 0.85;

/// Handles complaints: cites policy, opens a ticket, responds with empathy.
#[derive(Debug, Default)]
pub struct NegativeHandler;

impl NegativeHandler {
    fn priority_for(confidence: f64) -> TicketPriority {
        if confidence >= CRITICAL_CONFIDENCE_THRESHOLD {
            TicketPriority::Critical
        } else {
            TicketPriority::High
        }
    }
}

#[async_trait]
impl Handler for NegativeHandler {
    fn name(&self) -> &'static str {
        "negative_handler"
    }

    async fn handle(
        &self,
        message: &Message,
        classification: &ClassificationResult,
        ctx: &HandlerContext<'_>,
    ) -> Result<HandlerOutput, ProcessError> {
        // Fail before touching the repository so an injected database fault
        // can never leave a ticket behind.
        if let Err(injected) = ctx.chaos.check(Fault::DatabaseError) {
            return Err(HandlerError::DatabaseUnavailable(injected.to_string()).into());
        }

        let citations = ctx.policies.cite(&message.text);
        let cited_policy_ids: Vec<String> =
            citations.iter().map(|citation| citation.policy_id.clone()).collect();
        let priority = Self::priority_for(classification.confidence);

        let mut prompt = format!(
            "Write an empathetic reply to this customer complaint. Apologize, take \
             ownership, and describe the next step.\n\nCustomer message: {}",
            message.text
        );
        if !citations.is_empty() {
            prompt.push_str("\n\nCite these bank policies in the reply:");
            for citation in &citations {
                prompt.push_str(&format!("\n{}: {}", citation.policy_id, citation.excerpt));
            }
        }
        let completion = ctx.model.generate(&prompt).await?;

        let ticket_id = ctx
            .tickets
            .create(NewTicket { summary: message.text.clone(), priority })
            .await
            .map_err(|error| HandlerError::DatabaseUnavailable(error.to_string()))?;

        let mut text = completion.text;
        if !cited_policy_ids.is_empty() {
            text.push_str(&format!("\n\nApplicable policies: {}.", cited_policy_ids.join(", ")));
        }

        tracing::info!(
            event_name = "handler.negative.ticket_opened",
            message_id = %message.id.0,
            ticket_id = %ticket_id.0,
            priority = priority.as_number(),
            policies_cited = cited_policy_ids.len(),
            "complaint ticket opened"
        );

        Ok(HandlerOutput { text, cited_policy_ids, ticket_id: Some(ticket_id) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{NegativeHandler, CRITICAL_CONFIDENCE_THRESHOLD};
    use crate::chaos::{ChaosController, ChaosSnapshot, Fault};
    use crate::cost::CostTracker;
    use crate::domain::classification::{ClassificationResult, MessageLabel};
    use crate::domain::message::Message;
    use crate::domain::ticket::TicketPriority;
    use crate::errors::{HandlerError, ProcessError};
    use crate::handlers::{Handler, HandlerContext};
    use crate::model::ModelGateway;
    use crate::pipeline::testing::EchoModel;
    use crate::policy::PolicyService;
    use crate::tickets::{InMemoryTicketStore, TicketStore};

    async fn run(
        text: &str,
        confidence: f64,
        chaos: ChaosSnapshot,
        tickets: &InMemoryTicketStore,
    ) -> Result<crate::handlers::HandlerOutput, ProcessError> {
        let policies = PolicyService::builtin();
        let cost = CostTracker::default();
        let model = EchoModel::default();
        let gateway = ModelGateway::new(&model, &cost, &chaos, Duration::from_secs(5));
        let ctx =
            HandlerContext { policies: &policies, tickets, model: &gateway, chaos: &chaos };

        let message = Message::new(text);
        let classification = ClassificationResult::new(MessageLabel::Negative, confidence);
        NegativeHandler.handle(&message, &classification, &ctx).await
    }

    #[tokio::test]
    async fn high_confidence_complaint_opens_priority_one_ticket_with_citations() {
        let tickets = InMemoryTicketStore::new();
        let chaos = ChaosController::new().snapshot();
        let output = run("My card was stolen yesterday and I'm furious", 0.92, chaos, &tickets)
            .await
            .expect("handle");

        let ticket_id = output.ticket_id.expect("ticket created");
        let ticket = tickets.get(&ticket_id).await.expect("ticket stored");
        assert_eq!(ticket.priority, TicketPriority::Critical);
        assert!(output.cited_policy_ids.contains(&"POLICY-002".to_owned()));
        assert!(output.text.contains("POLICY-002"));
    }

    #[tokio::test]
    async fn priority_threshold_is_pinned_on_both_sides() {
        assert_eq!(
            NegativeHandler::priority_for(CRITICAL_CONFIDENCE_THRESHOLD),
            TicketPriority::Critical
        );
        assert_eq!(
            NegativeHandler::priority_for(CRITICAL_CONFIDENCE_THRESHOLD - 0.01),
            TicketPriority::High
        );
    }

    #[tokio::test]
    async fn database_fault_prevents_ticket_creation_entirely() {
        let tickets = InMemoryTicketStore::new();
        let controller = ChaosController::new();
        controller.set_fault(Fault::DatabaseError, true);

        let error = run("These fees are outrageous", 0.9, controller.snapshot(), &tickets)
            .await
            .expect_err("fault must fail the handler");

        assert!(matches!(
            error,
            ProcessError::Handler(HandlerError::DatabaseUnavailable(ref detail))
                if detail.contains("database_error")
        ));
        assert_eq!(tickets.count().await, 0, "repository create must never be invoked");
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_database_unavailable() {
        struct ClosedStore;

        #[async_trait::async_trait]
        impl TicketStore for ClosedStore {
            async fn create(
                &self,
                _ticket: crate::domain::ticket::NewTicket,
            ) -> Result<crate::domain::ticket::TicketId, crate::tickets::TicketStoreError>
            {
                Err(crate::tickets::TicketStoreError::Unavailable("pool closed".to_owned()))
            }

            async fn status_of(
                &self,
                _id: &crate::domain::ticket::TicketId,
            ) -> Result<Option<crate::domain::ticket::TicketStatus>, crate::tickets::TicketStoreError>
            {
                Err(crate::tickets::TicketStoreError::Unavailable("pool closed".to_owned()))
            }
        }

        let policies = PolicyService::builtin();
        let cost = CostTracker::default();
        let chaos = ChaosController::new().snapshot();
        let model = EchoModel::default();
        let gateway = ModelGateway::new(&model, &cost, &chaos, Duration::from_secs(5));
        let store = ClosedStore;
        let ctx =
            HandlerContext { policies: &policies, tickets: &store, model: &gateway, chaos: &chaos };

        let message = Message::new("I was double charged");
        let classification = ClassificationResult::new(MessageLabel::Negative, 0.7);
        let error =
            NegativeHandler.handle(&message, &classification, &ctx).await.expect_err("store down");

        assert!(matches!(
            error,
            ProcessError::Handler(HandlerError::DatabaseUnavailable(_))
        ));
    }
}
