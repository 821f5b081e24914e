use async_trait::async_trait;

use supportflow_core::domain::classification::MessageLabel;
use supportflow_core::model::{
    LanguageModel, ModelClassification, ModelCompletion, ModelError,
};

const POSITIVE_MARKERS: &[&str] = &[
    "thank", "thanks", "great", "love", "excellent", "appreciate", "awesome", "happy",
    "helpful", "wonderful", "amazing", "fantastic",
];

const NEGATIVE_MARKERS: &[&str] = &[
    "furious", "angry", "terrible", "stolen", "lost", "unacceptable", "frustrated",
    "worst", "complaint", "outrageous", "absurd", "ridiculous", "scam", "overcharged",
    "fraud", "disappointed",
];

const QUERY_MARKERS: &[&str] = &[
    "what", "when", "where", "how", "why", "status", "ticket", "question", "hours",
    "balance", "wondering",
];

/// Deterministic keyword model for demos and offline runs. Same text in, same
/// label and confidence out, every time.
#[derive(Clone, Debug, Default)]
pub struct LexiconModel;

impl LexiconModel {
    pub fn new() -> Self {
        Self
    }

    fn score(text: &str) -> (MessageLabel, f64) {
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(|token| token.to_lowercase())
            .collect();

        let hits = |markers: &[&str]| {
            tokens.iter().filter(|token| markers.contains(&token.as_str())).count()
        };
        let positive = hits(POSITIVE_MARKERS);
        let negative = hits(NEGATIVE_MARKERS);
        let mut query = hits(QUERY_MARKERS);
        if text.contains('?') {
            query += 1;
        }

        // Complaints win ties: missing one costs more than a misfiled query.
        let (label, top) = if negative >= positive && negative >= query && negative > 0 {
            (MessageLabel::Negative, negative)
        } else if positive >= query && positive > 0 {
            (MessageLabel::Positive, positive)
        } else if query > 0 {
            (MessageLabel::Query, query)
        } else {
            return (MessageLabel::Query, 0.5);
        };

        let confidence = (0.65 + 0.1 * top as f64).min(0.95);
        (label, confidence)
    }

    fn respond(prompt: &str) -> String {
        if prompt.contains("complaint") {
            "I'm very sorry about the experience you've described, and I understand the \
             frustration. We've opened a ticket so a support specialist can put this right, \
             and they will reach out with next steps shortly."
                .to_owned()
        } else if prompt.contains("positive") {
            "Thank you for the kind feedback. We're delighted the experience worked well for \
             you, and we've shared your note with the team."
                .to_owned()
        } else {
            "Thanks for reaching out. A support specialist will follow up with the details \
             you need."
                .to_owned()
        }
    }
}

#[async_trait]
impl LanguageModel for LexiconModel {
    async fn classify(&self, text: &str) -> Result<ModelClassification, ModelError> {
        let (label, confidence) = Self::score(text);
        Ok(ModelClassification {
            label,
            confidence,
            tokens_in: estimate_tokens(text),
            tokens_out: 12,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<ModelCompletion, ModelError> {
        let text = Self::respond(prompt);
        let tokens_out = estimate_tokens(&text);
        Ok(ModelCompletion { text, tokens_in: estimate_tokens(prompt), tokens_out })
    }
}

// Rough 4-chars-per-token heuristic, floor of one.
fn estimate_tokens(text: &str) -> u32 {
    ((text.len() / 4).max(1)) as u32
}
