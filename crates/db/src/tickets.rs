use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use supportflow_core::domain::ticket::{NewTicket, Ticket, TicketId, TicketPriority, TicketStatus};
use supportflow_core::tickets::{TicketStore, TicketStoreError};

use crate::DbPool;

/// SQLite-backed ticket repository. The public id `T-<n>` maps directly onto
/// the autoincrement rowid, so a create is a single atomic insert and
/// concurrent creates can never collide.
pub struct SqlTicketStore {
    pool: DbPool,
}

impl SqlTicketStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: &TicketId) -> Result<Option<Ticket>, TicketStoreError> {
        let Some(rowid) = numeric_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query(
            "SELECT id, status, priority, summary, created_at FROM tickets WHERE id = ?1",
        )
        .bind(rowid)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(decode_ticket).transpose()
    }

    pub async fn count(&self) -> Result<i64, TicketStoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM tickets")
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(row.get::<i64, _>("count"))
    }
}

#[async_trait]
impl TicketStore for SqlTicketStore {
    async fn create(&self, ticket: NewTicket) -> Result<TicketId, TicketStoreError> {
        let result = sqlx::query(
            "INSERT INTO tickets (status, priority, summary, created_at)
             VALUES ('open', ?1, ?2, ?3)",
        )
        .bind(ticket.priority.as_number())
        .bind(&ticket.summary)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        let id = TicketId(format!("T-{}", result.last_insert_rowid()));
        tracing::debug!(event_name = "db.ticket_created", ticket_id = %id.0, "ticket persisted");
        Ok(id)
    }

    async fn status_of(&self, id: &TicketId) -> Result<Option<TicketStatus>, TicketStoreError> {
        let Some(rowid) = numeric_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query("SELECT status FROM tickets WHERE id = ?1")
            .bind(rowid)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        row.map(|row| {
            let raw = row.get::<String, _>("status");
            TicketStatus::parse(&raw)
                .ok_or_else(|| TicketStoreError::Unavailable(format!("bad status `{raw}`")))
        })
        .transpose()
    }
}

// An id that doesn't fit the `T-<n>` shape can't exist in this store; treat
// it as not found rather than an error.
fn numeric_id(id: &TicketId) -> Option<i64> {
    id.0.strip_prefix("T-")?.parse::<i64>().ok()
}

fn unavailable(error: sqlx::Error) -> TicketStoreError {
    TicketStoreError::Unavailable(error.to_string())
}

fn decode_ticket(row: sqlx::sqlite::SqliteRow) -> Result<Ticket, TicketStoreError> {
    let status_raw = row.get::<String, _>("status");
    let status = TicketStatus::parse(&status_raw)
        .ok_or_else(|| TicketStoreError::Unavailable(format!("bad status `{status_raw}`")))?;
    let priority_raw = row.get::<i64, _>("priority");
    let priority = TicketPriority::from_number(priority_raw)
        .ok_or_else(|| TicketStoreError::Unavailable(format!("bad priority `{priority_raw}`")))?;
    let created_raw = row.get::<String, _>("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map_err(|error| TicketStoreError::Unavailable(format!("bad created_at: {error}")))?
        .with_timezone(&Utc);

    Ok(Ticket {
        id: TicketId(format!("T-{}", row.get::<i64, _>("id"))),
        status,
        priority,
        summary: row.get::<String, _>("summary"),
        created_at,
    })
}
