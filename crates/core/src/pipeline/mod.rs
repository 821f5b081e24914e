pub mod orchestrator;
pub mod states;

pub use orchestrator::{Orchestrator, DEFAULT_MODEL_DEADLINE};
pub use states::PipelineStage;
