pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod tickets;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{SeedResult, SeedTicket, VerificationResult, SEED_TICKETS};
pub use tickets::SqlTicketStore;
