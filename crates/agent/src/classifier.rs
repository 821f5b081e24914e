use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use supportflow_core::domain::classification::MessageLabel;
use supportflow_core::model::{
    LanguageModel, ModelClassification, ModelCompletion, ModelError,
};

use crate::llm::LlmClient;
use crate::prompts::{CLASSIFIER_SYSTEM_PROMPT, RESPONDER_SYSTEM_PROMPT};

const DEFAULT_CONFIDENCE: f64 = 0.5;

/// `LanguageModel` over a completion transport. Classification asks for a
/// strict JSON payload and refuses anything that doesn't parse into the
/// closed label set.
pub struct LlmBackedModel {
    client: Arc<dyn LlmClient>,
}

impl LlmBackedModel {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LanguageModel for LlmBackedModel {
    async fn classify(&self, text: &str) -> Result<ModelClassification, ModelError> {
        let completion = self
            .client
            .complete(CLASSIFIER_SYSTEM_PROMPT, text)
            .await
            .map_err(|error| ModelError::Provider(error.to_string()))?;

        let (label, confidence) = parse_classification(&completion.text)?;
        tracing::debug!(
            event_name = "agent.classified",
            label = label.as_str(),
            confidence,
            "classifier payload parsed"
        );

        Ok(ModelClassification {
            label,
            confidence,
            tokens_in: completion.tokens_in,
            tokens_out: completion.tokens_out,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<ModelCompletion, ModelError> {
        let completion = self
            .client
            .complete(RESPONDER_SYSTEM_PROMPT, prompt)
            .await
            .map_err(|error| ModelError::Provider(error.to_string()))?;

        Ok(ModelCompletion {
            text: completion.text,
            tokens_in: completion.tokens_in,
            tokens_out: completion.tokens_out,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ClassifierPayload {
    category: String,
    confidence: Option<f64>,
    #[allow(dead_code)]
    reasoning: Option<String>,
}

fn parse_classification(raw: &str) -> Result<(MessageLabel, f64), ModelError> {
    let cleaned = strip_code_fences(raw.trim());

    let payload: ClassifierPayload = serde_json::from_str(cleaned)
        .map_err(|error| ModelError::MalformedPayload(format!("invalid JSON: {error}")))?;

    let label = MessageLabel::parse(&payload.category).ok_or_else(|| {
        ModelError::MalformedPayload(format!("unknown category `{}`", payload.category))
    })?;
    let confidence = payload.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0);

    Ok((label, confidence))
}

// Some providers wrap JSON in a markdown code fence despite instructions.
fn strip_code_fences(raw: &str) -> &str {
    if !raw.starts_with("```") {
        return raw;
    }
    let inner = match raw.find('\n') {
        Some(start) => &raw[start + 1..],
        None => return raw,
    };
    match inner.rfind("```") {
        Some(end) => inner[..end].trim(),
        None => raw,
    }
}
