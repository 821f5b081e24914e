//! Language-model capability for the triage pipeline.
//!
//! The orchestration core treats the model as an opaque capability behind the
//! `LanguageModel` trait; this crate supplies the two implementations:
//!
//! - `LlmBackedModel` (`classifier` module) - wraps a pluggable `LlmClient`,
//!   prompts it with the system prompts in `prompts`, and parses the strict
//!   JSON classification payload it is instructed to return.
//! - `LexiconModel` (`lexicon` module) - a deterministic keyword model for
//!   tests, demos, and offline runs. No network, no tokens billed upstream.
//!
//! # Safety Principle
//!
//! The model is strictly a translator. It never decides routing, priorities,
//! or ticket state. Those are deterministic decisions made by the core.

pub mod classifier;
pub mod lexicon;
pub mod llm;
pub mod prompts;

pub use classifier::LlmBackedModel;
pub use lexicon::LexiconModel;
pub use llm::{LlmClient, LlmCompletion};
