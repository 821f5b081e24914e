use serde::{Deserialize, Serialize};

/// Closed label set for message triage. Routing matches exhaustively on this
/// enum, so an unmapped label is a structural impossibility rather than a
/// runtime surprise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLabel {
    Positive,
    Negative,
    Query,
}

impl MessageLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Query => "query",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "query" => Some(Self::Query),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produced exactly once per message by the classifier capability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: MessageLabel,
    pub confidence: f64,
}

impl ClassificationResult {
    /// Confidence is clamped into `[0, 1]` at construction so downstream
    /// threshold checks never see an out-of-range value.
    pub fn new(label: MessageLabel, confidence: f64) -> Self {
        Self { label, confidence: confidence.clamp(0.0, 1.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassificationResult, MessageLabel};

    #[test]
    fn confidence_is_clamped_to_unit_interval() {
        assert_eq!(ClassificationResult::new(MessageLabel::Query, 1.7).confidence, 1.0);
        assert_eq!(ClassificationResult::new(MessageLabel::Query, -0.2).confidence, 0.0);
        assert_eq!(ClassificationResult::new(MessageLabel::Query, 0.42).confidence, 0.42);
    }

    #[test]
    fn label_round_trips_through_wire_name() {
        for label in [MessageLabel::Positive, MessageLabel::Negative, MessageLabel::Query] {
            assert_eq!(MessageLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(MessageLabel::parse("escalation"), None);
    }
}
