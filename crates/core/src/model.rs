use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::chaos::{ChaosSnapshot, Fault};
use crate::cost::CostTracker;
use crate::domain::classification::MessageLabel;
use crate::errors::HandlerError;

/// Raw classifier output, including the token usage the call consumed.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelClassification {
    pub label: MessageLabel,
    pub confidence: f64,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelCompletion {
    pub text: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("model provider failure: {0}")]
    Provider(String),
    #[error("model returned a malformed payload: {0}")]
    MalformedPayload(String),
}

/// The language-model capability. The orchestration core only invokes it,
/// charges its token usage, and bounds it with a deadline; everything else
/// about inference is someone else's problem.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ModelClassification, ModelError>;
    async fn generate(&self, prompt: &str) -> Result<ModelCompletion, ModelError>;
}

/// Wraps every model call with the three cross-cutting concerns the pipeline
/// requires: the chaos `timeout` fault, a hard deadline, and cost recording.
/// Tokens are charged even when a later stage fails.
pub struct ModelGateway<'a> {
    model: &'a dyn LanguageModel,
    cost: &'a CostTracker,
    chaos: &'a ChaosSnapshot,
    deadline: Duration,
}

impl<'a> ModelGateway<'a> {
    pub fn new(
        model: &'a dyn LanguageModel,
        cost: &'a CostTracker,
        chaos: &'a ChaosSnapshot,
        deadline: Duration,
    ) -> Self {
        Self { model, cost, chaos, deadline }
    }

    pub async fn classify(&self, text: &str) -> Result<ModelClassification, HandlerError> {
        self.check_timeout_fault()?;
        let classification = tokio::time::timeout(self.deadline, self.model.classify(text))
            .await
            .map_err(|_| deadline_error(self.deadline))?
            .map_err(|error| HandlerError::ModelUnavailable(error.to_string()))?;
        self.cost.record_usage(classification.tokens_in, classification.tokens_out);
        Ok(classification)
    }

    pub async fn generate(&self, prompt: &str) -> Result<ModelCompletion, HandlerError> {
        self.check_timeout_fault()?;
        let completion = tokio::time::timeout(self.deadline, self.model.generate(prompt))
            .await
            .map_err(|_| deadline_error(self.deadline))?
            .map_err(|error| HandlerError::ModelUnavailable(error.to_string()))?;
        self.cost.record_usage(completion.tokens_in, completion.tokens_out);
        Ok(completion)
    }

    fn check_timeout_fault(&self) -> Result<(), HandlerError> {
        if let Err(injected) = self.chaos.check(Fault::Timeout) {
            return Err(HandlerError::Timeout(injected.to_string()));
        }
        Ok(())
    }
}

fn deadline_error(deadline: Duration) -> HandlerError {
    HandlerError::Timeout(format!("model call exceeded {}s deadline", deadline.as_secs()))
}
