//! Turn Orchestrator
//!
//! Sequences retrieval, selection, prompt composition and generation for the
//! three ways a podcast segment is produced:
//!
//! - an autonomous turn, where the Curious host asks and the Explainer answers;
//! - an interjection, where a listener's question replaces the Curious host;
//! - an episode, a run of autonomous turns on one topic.
//!
//! Every entry point is independent. No state is shared between requests and
//! no text is carried between turns: each turn re-retrieves its own context
//! from the driving query.

use crate::{
    error::OrchestratorError,
    llm_client::GenerationClient,
    passage::ContextBlock,
    prompts::PromptComposer,
    retriever::{ContextRetriever, DEFAULT_TOP_K},
    selector::{DEFAULT_CONTEXT_LIMIT, select},
    turn::{Episode, Interjection, Role, Turn, is_wrap_up},
};
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub const TOPIC_REQUIRED: &str = "Topic cannot be empty.";
pub const QUESTION_REQUIRED: &str = "User input cannot be empty.";
pub const TURNS_REQUIRED: &str = "Number of turns must be at least 1.";

/// Default upper bound on a single generation call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Tunables shared by every entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Candidates requested from the retriever.
    pub top_k: usize,
    /// Candidates kept by the selector.
    pub context_limit: usize,
    /// A generation call exceeding this fails the turn.
    pub generation_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }
}

/// What to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnRequest {
    Autonomous { topic: String },
    Interjection { user_text: String },
    Episode { topic: String, num_turns: usize },
}

impl TurnRequest {
    pub fn mode(&self) -> &'static str {
        match self {
            TurnRequest::Autonomous { .. } => "autonomous",
            TurnRequest::Interjection { .. } => "interjection",
            TurnRequest::Episode { .. } => "episode",
        }
    }
}

/// The result matching each [`TurnRequest`] variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Autonomous(Turn),
    Interjection(Interjection),
    Episode(Episode),
}

/// Drives the Curious/Explainer dialogue over injected collaborators.
pub struct Orchestrator {
    retriever: Arc<dyn ContextRetriever>,
    generator: Arc<dyn GenerationClient>,
    composer: PromptComposer,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(retriever: Arc<dyn ContextRetriever>, generator: Arc<dyn GenerationClient>) -> Self {
        Self {
            retriever,
            generator,
            composer: PromptComposer::default(),
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn with_composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Dispatches a request to its entry point.
    pub async fn run(&self, request: TurnRequest) -> Result<TurnOutcome, OrchestratorError> {
        self.run_until_cancelled(request, &CancellationToken::new())
            .await
    }

    /// Like [`Orchestrator::run`], but episodes stop at the next turn boundary
    /// once `cancel` fires. Single turns are never interrupted.
    #[instrument(skip_all, fields(mode = request.mode()))]
    pub async fn run_until_cancelled(
        &self,
        request: TurnRequest,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, OrchestratorError> {
        match request {
            TurnRequest::Autonomous { topic } => {
                self.autonomous_turn(&topic).await.map(TurnOutcome::Autonomous)
            }
            TurnRequest::Interjection { user_text } => self
                .interjection_turn(&user_text)
                .await
                .map(TurnOutcome::Interjection),
            TurnRequest::Episode { topic, num_turns } => self
                .episode_until_cancelled(&topic, num_turns, cancel)
                .await
                .map(TurnOutcome::Episode),
        }
    }

    /// Curious asks about `topic`, Explainer answers with a wrap-up.
    #[instrument(skip(self, topic), fields(topic = %topic))]
    pub async fn autonomous_turn(&self, topic: &str) -> Result<Turn, OrchestratorError> {
        require_text(topic, TOPIC_REQUIRED)?;
        self.podcast_turn(topic, 1, true).await
    }

    /// Explainer answers a listener's question directly, with a wrap-up.
    #[instrument(skip_all, fields(question_len = user_text.len()))]
    pub async fn interjection_turn(&self, user_text: &str) -> Result<Interjection, OrchestratorError> {
        require_text(user_text, QUESTION_REQUIRED)?;

        let context = self.gather_context(user_text).await;
        let prompt = self.composer.explainer_prompt(&context, user_text, true);
        let explainer_answer = self.generate(Role::Explainer, &prompt).await?;

        info!("Interjection answered");
        Ok(Interjection {
            user_text: user_text.to_string(),
            explainer_answer,
        })
    }

    /// Runs `num_turns` autonomous turns on the same topic.
    pub async fn episode(&self, topic: &str, num_turns: usize) -> Result<Episode, OrchestratorError> {
        self.episode_until_cancelled(topic, num_turns, &CancellationToken::new())
            .await
    }

    /// Runs an episode, checking `cancel` before each turn starts.
    ///
    /// Turns run strictly in sequence and only the last one carries the
    /// wrap-up. A failing turn aborts the rest; the finished prefix travels
    /// with the error.
    #[instrument(skip(self, topic, cancel), fields(topic = %topic))]
    pub async fn episode_until_cancelled(
        &self,
        topic: &str,
        num_turns: usize,
        cancel: &CancellationToken,
    ) -> Result<Episode, OrchestratorError> {
        require_text(topic, TOPIC_REQUIRED)?;
        if num_turns == 0 {
            return Err(OrchestratorError::InvalidInput(TURNS_REQUIRED.to_string()));
        }

        let mut turns = Vec::new();
        for position in 0..num_turns {
            if cancel.is_cancelled() {
                warn!(completed = turns.len(), "Episode cancelled at turn boundary");
                return Err(OrchestratorError::Cancelled {
                    completed: turns,
                    requested: num_turns,
                });
            }

            let wrap_up = is_wrap_up(position, num_turns);
            match self.podcast_turn(topic, position + 1, wrap_up).await {
                Ok(turn) => turns.push(turn),
                Err(source) => {
                    error!(turn = position + 1, error = %source, "Episode aborted");
                    return Err(OrchestratorError::EpisodeAborted {
                        completed: turns,
                        failed_turn: position + 1,
                        requested: num_turns,
                        source: Box::new(source),
                    });
                }
            }
        }

        info!(turns = turns.len(), "Episode complete");
        Ok(turns)
    }

    #[instrument(skip(self, topic, index), fields(turn = index))]
    async fn podcast_turn(
        &self,
        topic: &str,
        index: usize,
        wrap_up: bool,
    ) -> Result<Turn, OrchestratorError> {
        let context = self.gather_context(topic).await;

        let curious_prompt = self.composer.curious_prompt(&context);
        let curious_question = self.generate(Role::Curious, &curious_prompt).await?;

        let explainer_prompt = self
            .composer
            .explainer_prompt(&context, &curious_question, wrap_up);
        let explainer_answer = self.generate(Role::Explainer, &explainer_prompt).await?;

        debug!("Turn generated");
        Ok(Turn {
            index,
            curious_question,
            explainer_answer,
            is_wrap_up: wrap_up,
        })
    }

    async fn gather_context(&self, query: &str) -> ContextBlock {
        let candidates = self.retriever.retrieve(query, self.settings.top_k).await;
        let context = select(&candidates, self.settings.context_limit);
        if context.is_fallback() {
            warn!("No passages retrieved, prompting with placeholder context");
        } else {
            debug!(
                retrieved = candidates.len(),
                used = candidates.len().min(self.settings.context_limit),
                "Context selected"
            );
        }
        context
    }

    async fn generate(&self, role: Role, prompt: &str) -> Result<String, OrchestratorError> {
        let timeout = self.settings.generation_timeout;
        let text = match tokio::time::timeout(timeout, self.generator.generate(prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(source)) => return Err(generation_failure(role, source)),
            Err(_) => {
                return Err(generation_failure(
                    role,
                    anyhow!("timed out after {}ms", timeout.as_millis()),
                ));
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(generation_failure(role, anyhow!("model returned no text")));
        }
        Ok(text.to_string())
    }
}

fn generation_failure(role: Role, source: anyhow::Error) -> OrchestratorError {
    error!(%role, error = ?source, "Generation failed");
    OrchestratorError::GenerationFailure { role, source }
}

fn require_text(text: &str, message: &str) -> Result<(), OrchestratorError> {
    if text.trim().is_empty() {
        warn!("{}", message);
        return Err(OrchestratorError::InvalidInput(message.to_string()));
    }
    Ok(())
}
