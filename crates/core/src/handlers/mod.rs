use async_trait::async_trait;

use crate::chaos::ChaosSnapshot;
use crate::domain::classification::{ClassificationResult, MessageLabel};
use crate::domain::message::Message;
use crate::domain::ticket::TicketId;
use crate::errors::ProcessError;
use crate::model::ModelGateway;
use crate::policy::PolicyService;
use crate::tickets::TicketStore;

pub mod negative;
pub mod positive;
pub mod query;

pub use negative::NegativeHandler;
pub use positive::PositiveHandler;
pub use query::QueryHandler;

/// Everything a handler may touch, borrowed from the orchestrator for the
/// duration of one stage call.
pub struct HandlerContext<'a> {
    pub policies: &'a PolicyService,
    pub tickets: &'a dyn TicketStore,
    pub model: &'a ModelGateway<'a>,
    pub chaos: &'a ChaosSnapshot,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerOutput {
    pub text: String,
    pub cited_policy_ids: Vec<String>,
    pub ticket_id: Option<TicketId>,
}

impl HandlerOutput {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: text.into(), cited_policy_ids: Vec::new(), ticket_id: None }
    }
}

#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        message: &Message,
        classification: &ClassificationResult,
        ctx: &HandlerContext<'_>,
    ) -> Result<HandlerOutput, ProcessError>;
}

/// Closed dispatch table: one handler per label, checked exhaustively. There
/// is deliberately no wildcard arm, so an unmapped label cannot compile.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    positive: PositiveHandler,
    negative: NegativeHandler,
    query: QueryHandler,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&self, label: MessageLabel) -> &dyn Handler {
        match label {
            MessageLabel::Positive => &self.positive,
            MessageLabel::Negative => &self.negative,
            MessageLabel::Query => &self.query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HandlerRegistry;
    use crate::domain::classification::MessageLabel;

    #[test]
    fn every_label_routes_to_its_own_handler() {
        let registry = HandlerRegistry::new();
        assert_eq!(registry.select(MessageLabel::Positive).name(), "positive_handler");
        assert_eq!(registry.select(MessageLabel::Negative).name(), "negative_handler");
        assert_eq!(registry.select(MessageLabel::Query).name(), "query_handler");
    }
}
