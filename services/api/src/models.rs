//! API Models
//!
//! Request and response bodies of the HTTP surface, annotated for OpenAPI
//! generation with `utoipa`. Conversions from the core turn types live here so
//! handlers stay thin.

use podcast_core::{Interjection, Turn, TurnOutcome};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Topic used when a podcast request names none.
pub const DEFAULT_TOPIC: &str = "overview";

/// Largest episode the HTTP surface will run in one request.
pub const MAX_EPISODE_TURNS: usize = 10;

/// Dispatching body for `POST /conversation/podcast`.
///
/// A present `question` selects interjection mode; otherwise `num_turns`
/// above one selects an episode, and anything else a single autonomous turn.
#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct PodcastRequest {
    #[schema(example = "What happens at the event horizon?")]
    pub question: Option<String>,
    #[schema(example = "black holes")]
    pub topic: Option<String>,
    #[schema(example = 3)]
    pub num_turns: Option<usize>,
}

/// Body for `POST /conversation/`.
#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct ConversationRequest {
    #[schema(example = "Why can't light escape a black hole?")]
    pub question: Option<String>,
}

/// Body for the audio endpoints.
#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct AudioRequest {
    pub question: Option<String>,
    #[schema(example = "black holes")]
    pub topic: Option<String>,
    /// Optional closing line voiced after the hosts.
    pub moderator: Option<String>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// Topic of the streamed turn; defaults to `overview`.
    pub topic: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AutonomousTurnResponse {
    pub curious: String,
    pub explainer: String,
    /// Same text as `explainer`, kept for clients that read `answer`.
    pub answer: String,
}

impl From<&Turn> for AutonomousTurnResponse {
    fn from(turn: &Turn) -> Self {
        Self {
            curious: turn.curious_question.clone(),
            explainer: turn.explainer_answer.clone(),
            answer: turn.explainer_answer.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct InterjectionResponse {
    pub user_question: String,
    pub explainer: String,
    pub answer: String,
}

impl From<&Interjection> for InterjectionResponse {
    fn from(interjection: &Interjection) -> Self {
        Self {
            user_question: interjection.user_text.clone(),
            explainer: interjection.explainer_answer.clone(),
            answer: interjection.explainer_answer.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct EpisodeTurnResponse {
    /// 1-based position within the episode.
    pub turn: usize,
    pub curious: String,
    pub explainer: String,
    pub is_wrap_up: bool,
}

impl From<&Turn> for EpisodeTurnResponse {
    fn from(turn: &Turn) -> Self {
        Self {
            turn: turn.index,
            curious: turn.curious_question.clone(),
            explainer: turn.explainer_answer.clone(),
            is_wrap_up: turn.is_wrap_up,
        }
    }
}

/// Response of the dispatching endpoint; its shape follows the selected mode.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PodcastResponse {
    Episode(Vec<EpisodeTurnResponse>),
    Interjection(InterjectionResponse),
    Autonomous(AutonomousTurnResponse),
}

impl From<TurnOutcome> for PodcastResponse {
    fn from(outcome: TurnOutcome) -> Self {
        match outcome {
            TurnOutcome::Autonomous(turn) => PodcastResponse::Autonomous((&turn).into()),
            TurnOutcome::Interjection(interjection) => {
                PodcastResponse::Interjection((&interjection).into())
            }
            TurnOutcome::Episode(turns) => {
                PodcastResponse::Episode(turns.iter().map(EpisodeTurnResponse::from).collect())
            }
        }
    }
}

/// One voiced segment, base64-encoded MP3.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AudioSegment {
    #[schema(example = "explainer")]
    pub role: String,
    pub audio: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AudioFailure {
    pub role: String,
    pub error: String,
}

/// Turn text plus one audio clip per role.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Default)]
pub struct AudioTurnResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curious: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_question: Option<String>,
    pub explainer: String,
    pub answer: String,
    pub audio: Vec<AudioSegment>,
    /// Roles whose synthesis failed; the text above is unaffected.
    pub audio_errors: Vec<AudioFailure>,
}

/// Turn text plus a single recording of the whole turn.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Default)]
pub struct CombinedAudioResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curious: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_question: Option<String>,
    pub explainer: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_error: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    /// Turns finished before an episode stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_turns: Option<Vec<EpisodeTurnResponse>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            completed_turns: None,
        }
    }
}
