use sqlx::Row;

use supportflow_core::tickets::TicketStoreError;

use crate::connection::DbPool;

/// Canonical demo seed. `T-123` in `in_progress` is the fixture the status
/// query walkthrough depends on; keep it stable.
pub const SEED_TICKETS: &[SeedTicket] = &[
    SeedTicket {
        id: 101,
        status: "open",
        priority: 2,
        summary: "Unexpected maintenance fee on checking account",
        created_at: "2026-08-01T09:15:00+00:00",
    },
    SeedTicket {
        id: 123,
        status: "in_progress",
        priority: 1,
        summary: "Reported lost card, replacement requested",
        created_at: "2026-08-03T14:02:00+00:00",
    },
    SeedTicket {
        id: 207,
        status: "resolved",
        priority: 3,
        summary: "Question about wire transfer cut-off times",
        created_at: "2026-08-10T11:40:00+00:00",
    },
];

#[derive(Clone, Copy, Debug)]
pub struct SeedTicket {
    pub id: i64,
    pub status: &'static str,
    pub priority: i64,
    pub summary: &'static str,
    pub created_at: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub tickets_inserted: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub valid: bool,
    pub problems: Vec<String>,
}

/// Idempotent: re-running overwrites the seed rows and leaves any other
/// tickets alone. Explicit ids keep the autoincrement sequence above them.
pub async fn seed(pool: &DbPool) -> Result<SeedResult, TicketStoreError> {
    for ticket in SEED_TICKETS {
        sqlx::query(
            "INSERT OR REPLACE INTO tickets (id, status, priority, summary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(ticket.id)
        .bind(ticket.status)
        .bind(ticket.priority)
        .bind(ticket.summary)
        .bind(ticket.created_at)
        .execute(pool)
        .await
        .map_err(|error| TicketStoreError::Unavailable(error.to_string()))?;
    }

    tracing::info!(
        event_name = "db.seeded",
        tickets = SEED_TICKETS.len(),
        "demo fixtures inserted"
    );
    Ok(SeedResult { tickets_inserted: SEED_TICKETS.len() })
}

pub async fn verify(pool: &DbPool) -> Result<VerificationResult, TicketStoreError> {
    let mut problems = Vec::new();

    for ticket in SEED_TICKETS {
        let row = sqlx::query("SELECT status, priority FROM tickets WHERE id = ?1")
            .bind(ticket.id)
            .fetch_optional(pool)
            .await
            .map_err(|error| TicketStoreError::Unavailable(error.to_string()))?;

        match row {
            None => problems.push(format!("seed ticket T-{} is missing", ticket.id)),
            Some(row) => {
                let status = row.get::<String, _>("status");
                if status != ticket.status {
                    problems.push(format!(
                        "seed ticket T-{} has status `{status}`, expected `{}`",
                        ticket.id, ticket.status
                    ));
                }
                let priority = row.get::<i64, _>("priority");
                if priority != ticket.priority {
                    problems.push(format!(
                        "seed ticket T-{} has priority {priority}, expected {}",
                        ticket.id, ticket.priority
                    ));
                }
            }
        }
    }

    Ok(VerificationResult { valid: problems.is_empty(), problems })
}
