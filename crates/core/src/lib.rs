//! Podcast Core
//!
//! The retrieval-augmented dialogue engine behind the two-host podcast: a
//! Curious host asks, an Explainer host answers, and both are grounded in
//! passages pulled from a semantic index. External services (embedding model,
//! vector index, language model, speech synthesis) are reached through the
//! traits defined here and injected at startup.

pub mod embedding;
pub mod error;
pub mod index;
pub mod llm_client;
pub mod orchestrator;
pub mod passage;
pub mod prompts;
pub mod retriever;
pub mod selector;
pub mod speech;
pub mod turn;

pub use error::OrchestratorError;
pub use orchestrator::{Orchestrator, OrchestratorSettings, TurnOutcome, TurnRequest};
pub use passage::{ContextBlock, ScoredPassage};
pub use turn::{Episode, Interjection, Role, Turn};
