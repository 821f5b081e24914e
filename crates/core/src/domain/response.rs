use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ticket::TicketId;

/// The single well-formed result of processing a message. Produced for every
/// call, success or graceful failure; callers never see a raw error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub cited_policy_ids: Vec<String>,
    pub ticket_id: Option<TicketId>,
    pub session_cost: Decimal,
}

impl Response {
    pub fn success(
        text: impl Into<String>,
        cited_policy_ids: Vec<String>,
        ticket_id: Option<TicketId>,
        session_cost: Decimal,
    ) -> Self {
        Self { text: text.into(), cited_policy_ids, ticket_id, session_cost }
    }

    /// Graceful-failure response. The underlying reason is recorded only in
    /// the audit trail, never surfaced here.
    pub fn degraded(session_cost: Decimal) -> Self {
        Self {
            text: crate::errors::GENERIC_FAILURE_TEXT.to_string(),
            cited_policy_ids: Vec::new(),
            ticket_id: None,
            session_cost,
        }
    }
}
