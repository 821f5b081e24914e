use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::ticket::{NewTicket, Ticket, TicketId, TicketStatus};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TicketStoreError {
    #[error("ticket store unavailable: {0}")]
    Unavailable(String),
}

/// External ticket repository capability. Create and status reads must be
/// atomic per ticket id; the orchestration core assumes nothing beyond that.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(&self, ticket: NewTicket) -> Result<TicketId, TicketStoreError>;
    async fn status_of(&self, id: &TicketId) -> Result<Option<TicketStatus>, TicketStoreError>;
}

/// In-process store for tests and offline runs.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<String, Ticket>>,
    next_id: AtomicU64,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-loads a ticket under a fixed id, for seeding query scenarios.
    pub async fn insert(&self, ticket: Ticket) {
        let mut tickets = self.tickets.write().await;
        tickets.insert(ticket.id.0.clone(), ticket);
    }

    pub async fn get(&self, id: &TicketId) -> Option<Ticket> {
        let tickets = self.tickets.read().await;
        tickets.get(&id.0).cloned()
    }

    pub async fn count(&self) -> usize {
        let tickets = self.tickets.read().await;
        tickets.len()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn create(&self, ticket: NewTicket) -> Result<TicketId, TicketStoreError> {
        let sequence = self.next_id.fetch_add(1, Ordering::SeqCst) + 1_000;
        let id = TicketId(format!("T-{sequence}"));
        let mut tickets = self.tickets.write().await;
        tickets.insert(
            id.0.clone(),
            Ticket {
                id: id.clone(),
                status: TicketStatus::Open,
                priority: ticket.priority,
                summary: ticket.summary,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn status_of(&self, id: &TicketId) -> Result<Option<TicketStatus>, TicketStoreError> {
        let tickets = self.tickets.read().await;
        Ok(tickets.get(&id.0).map(|ticket| ticket.status))
    }
}
