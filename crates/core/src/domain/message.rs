use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Immutable ingress record. Created once when a customer message arrives
/// and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: MessageId(Uuid::new_v4().to_string()),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}
