use async_trait::async_trait;

use super::{Handler, HandlerContext, HandlerOutput};
use crate::chaos::Fault;
use crate::domain::classification::ClassificationResult;
use crate::domain::message::Message;
use crate::domain::ticket::TicketId;
use crate::errors::{HandlerError, ProcessError};

/// Answers ticket status questions. Replies are templated from the stored
/// status rather than generated, so a status query never spends model tokens.
#[derive(Debug, Default)]
pub struct QueryHandler;

/// First `T-<digits>` token in the text, matched case-insensitively and
/// normalized to uppercase. `None` when the message names no ticket.
pub fn extract_ticket_id(text: &str) -> Option<TicketId> {
    text.split(|c: char| !c.is_ascii_alphanumeric() && c != '-')
        .filter(|token| !token.is_empty())
        .find_map(|token| {
            let digits = token.strip_prefix("T-").or_else(|| token.strip_prefix("t-"))?;
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                Some(TicketId(format!("T-{digits}")))
            } else {
                None
            }
        })
}

#[async_trait]
impl Handler for QueryHandler {
    fn name(&self) -> &'static str {
        "query_handler"
    }

    async fn handle(
        &self,
        message: &Message,
        _classification: &ClassificationResult,
        ctx: &HandlerContext<'_>,
    ) -> Result<HandlerOutput, ProcessError> {
        if let Err(injected) = ctx.chaos.check(Fault::DatabaseError) {
            return Err(HandlerError::DatabaseUnavailable(injected.to_string()).into());
        }

        let ticket_id = extract_ticket_id(&message.text).ok_or(HandlerError::TicketIdNotFound)?;

        let status = ctx
            .tickets
            .status_of(&ticket_id)
            .await
            .map_err(|error| HandlerError::DatabaseUnavailable(error.to_string()))?;

        let text = match status {
            Some(status) => {
                tracing::info!(
                    event_name = "handler.query.status_reported",
                    message_id = %message.id.0,
                    ticket_id = %ticket_id.0,
                    status = status.as_str(),
                    "ticket status reported"
                );
                format!(
                    "Your ticket {} is currently {}: {}",
                    ticket_id.0,
                    status.as_str(),
                    status.describe()
                )
            }
            // An unknown id is an answer, not a failure.
            None => {
                tracing::info!(
                    event_name = "handler.query.unknown_ticket",
                    message_id = %message.id.0,
                    ticket_id = %ticket_id.0,
                    "status requested for unknown ticket"
                );
                format!(
                    "We couldn't find a ticket with id {}. Please double-check the id \
                     and try again.",
                    ticket_id.0
                )
            }
        };

        Ok(HandlerOutput { text, cited_policy_ids: Vec::new(), ticket_id: Some(ticket_id) })
    }
}
