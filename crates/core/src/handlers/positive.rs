use async_trait::async_trait;

use super::{Handler, HandlerContext, HandlerOutput};
use crate::domain::classification::ClassificationResult;
use crate::domain::message::Message;
use crate::errors::ProcessError;

/// Acknowledges positive feedback. No persistence, no policy lookup.
#[derive(Debug, Default)]
pub struct PositiveHandler;

#[async_trait]
impl Handler for PositiveHandler {
    fn name(&self) -> &'static str {
        "positive_handler"
    }

    async fn handle(
        &self,
        message: &Message,
        _classification: &ClassificationResult,
        ctx: &HandlerContext<'_>,
    ) -> Result<HandlerOutput, ProcessError> {
        let prompt = format!(
            "Write a short, warm acknowledgment of this positive customer feedback. \
             Thank the customer and reinforce the experience they described.\n\n\
             Customer message: {}",
            message.text
        );
        let completion = ctx.model.generate(&prompt).await?;

        tracing::info!(
            event_name = "handler.positive.acknowledged",
            message_id = %message.id.0,
            response_length = completion.text.len(),
            "positive feedback acknowledged"
        );

        Ok(HandlerOutput::text_only(completion.text))
    }
}
