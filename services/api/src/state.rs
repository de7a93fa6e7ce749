//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the orchestrator,
//! the optional speech synthesizer and the shutdown token shared by handlers.

use podcast_core::{Orchestrator, speech::SpeechSynthesizer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// `None` when no speech credential is configured.
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    /// Cancelled when the server begins a graceful shutdown.
    pub shutdown: CancellationToken,
}
