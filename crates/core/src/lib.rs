pub mod audit;
pub mod chaos;
pub mod config;
pub mod cost;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod model;
pub mod pipeline;
pub mod policy;
pub mod tickets;

pub use audit::{AuditAction, AuditEntry, AuditLog, AuditRecord, ChainVerification, InMemoryAuditLog};
pub use chaos::{ChaosController, ChaosInjectedFailure, ChaosSnapshot, Fault, UnknownFault};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, LlmProvider};
pub use cost::{CostRates, CostRecord, CostSnapshot, CostTracker};
pub use domain::classification::{ClassificationResult, MessageLabel};
pub use domain::message::{Message, MessageId, SessionId};
pub use domain::response::Response;
pub use domain::ticket::{NewTicket, Ticket, TicketId, TicketPriority, TicketStatus};
pub use errors::{HandlerError, ProcessError, GENERIC_FAILURE_TEXT};
pub use handlers::{Handler, HandlerContext, HandlerOutput, HandlerRegistry};
pub use model::{LanguageModel, ModelClassification, ModelCompletion, ModelError, ModelGateway};
pub use pipeline::{Orchestrator, PipelineStage};
pub use policy::{Policy, PolicyCitation, PolicyCorpusError, PolicyService};
pub use tickets::{InMemoryTicketStore, TicketStore, TicketStoreError};
