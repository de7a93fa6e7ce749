use crate::turn::{Role, Turn};
use thiserror::Error;

/// Failures surfaced by the turn orchestrator.
///
/// Retrieval problems never appear here: they are absorbed by the retriever
/// and show up only as fallback context.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The driving text was empty or the requested episode length was zero.
    /// Raised before any retrieval or generation call.
    #[error("{0}")]
    InvalidInput(String),

    /// The generation client errored, timed out or produced no text.
    #[error("generation failed for the {role} role: {source}")]
    GenerationFailure {
        role: Role,
        #[source]
        source: anyhow::Error,
    },

    /// A turn of a multi-turn episode failed; the turns before it are kept.
    #[error("episode aborted at turn {failed_turn} of {requested}: {source}")]
    EpisodeAborted {
        completed: Vec<Turn>,
        failed_turn: usize,
        requested: usize,
        #[source]
        source: Box<OrchestratorError>,
    },

    /// The episode was cancelled at a turn boundary.
    #[error("episode cancelled after {} of {requested} turns", .completed.len())]
    Cancelled { completed: Vec<Turn>, requested: usize },
}

impl OrchestratorError {
    /// Turns finished before the failure, if the error belongs to an episode.
    pub fn completed_turns(&self) -> &[Turn] {
        match self {
            OrchestratorError::EpisodeAborted { completed, .. }
            | OrchestratorError::Cancelled { completed, .. } => completed,
            _ => &[],
        }
    }
}
