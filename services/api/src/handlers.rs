//! Axum Handlers for the REST API
//!
//! This module turns HTTP requests into orchestrator calls and orchestrator
//! results into JSON or audio. It uses `utoipa` doc comments to generate
//! OpenAPI documentation.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use podcast_core::{
    OrchestratorError, Role, TurnRequest,
    speech::{SpeechScript, SpeechSynthesizer, synthesize_combined, synthesize_segments},
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::{
    audio_utils::{MP3_CONTENT_TYPE, encode_audio, encode_segments},
    models::{
        AudioFailure, AudioRequest, AudioTurnResponse, CombinedAudioResponse,
        ConversationRequest, DEFAULT_TOPIC, EpisodeTurnResponse, ErrorResponse, HealthResponse,
        InterjectionResponse, MAX_EPISODE_TURNS, PodcastRequest, PodcastResponse, StreamQuery,
    },
    state::AppState,
};

pub const QUESTION_MISSING: &str = "Field 'question' is required.";
pub const SPEECH_UNAVAILABLE: &str = "Speech synthesis is not configured.";

pub enum ApiError {
    BadRequest(String),
    Orchestrator(OrchestratorError),
    ServiceUnavailable(String),
    BadGateway(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
            }
            ApiError::ServiceUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(message)),
            )
                .into_response(),
            ApiError::BadGateway(err) => {
                error!("Upstream failure: {:?}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorResponse::new(format!("{:#}", err))),
                )
                    .into_response()
            }
            ApiError::Orchestrator(err) => orchestrator_error_response(err),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        Self::Orchestrator(err)
    }
}

fn orchestrator_error_response(err: OrchestratorError) -> Response {
    let status = match &err {
        OrchestratorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        OrchestratorError::GenerationFailure { .. } | OrchestratorError::EpisodeAborted { .. } => {
            StatusCode::BAD_GATEWAY
        }
        OrchestratorError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
        error!(error = ?err, "Turn failed");
    }

    let completed_turns = match &err {
        OrchestratorError::EpisodeAborted { .. } | OrchestratorError::Cancelled { .. } => Some(
            err.completed_turns()
                .iter()
                .map(EpisodeTurnResponse::from)
                .collect(),
        ),
        _ => None,
    };
    let body = ErrorResponse {
        error: err.to_string(),
        completed_turns,
    };
    (status, Json(body)).into_response()
}

/// Maps a podcast request body onto an orchestrator request.
pub fn dispatch(payload: PodcastRequest) -> Result<TurnRequest, ApiError> {
    if let Some(user_text) = payload.question {
        return Ok(TurnRequest::Interjection { user_text });
    }

    let topic = payload.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());
    match payload.num_turns {
        Some(n) if n > MAX_EPISODE_TURNS => Err(ApiError::BadRequest(format!(
            "Number of turns cannot exceed {}.",
            MAX_EPISODE_TURNS
        ))),
        Some(n) if n > 1 => Ok(TurnRequest::Episode {
            topic,
            num_turns: n,
        }),
        _ => Ok(TurnRequest::Autonomous { topic }),
    }
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Produce a podcast turn, an episode, or an answer to a listener question.
#[utoipa::path(
    post,
    path = "/conversation/podcast",
    request_body = PodcastRequest,
    responses(
        (status = 200, description = "Turn, interjection or episode, depending on the request", body = PodcastResponse),
        (status = 400, description = "Empty topic or question, or too many turns", body = ErrorResponse),
        (status = 502, description = "Generation failed; episodes include completed turns", body = ErrorResponse),
        (status = 503, description = "Server is shutting down", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn podcast(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PodcastRequest>,
) -> Result<Json<PodcastResponse>, ApiError> {
    let request = dispatch(payload)?;
    info!(mode = request.mode(), "Dispatching podcast request");

    let outcome = state
        .orchestrator
        .run_until_cancelled(request, &state.shutdown)
        .await?;
    Ok(Json(outcome.into()))
}

/// Answer a listener question directly.
#[utoipa::path(
    post,
    path = "/conversation/",
    request_body = ConversationRequest,
    responses(
        (status = 200, description = "The Explainer's answer", body = InterjectionResponse),
        (status = 400, description = "Missing or empty question", body = ErrorResponse),
        (status = 502, description = "Generation failed", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn converse(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConversationRequest>,
) -> Result<Json<InterjectionResponse>, ApiError> {
    let question = payload
        .question
        .ok_or_else(|| ApiError::BadRequest(QUESTION_MISSING.to_string()))?;

    let interjection = state.orchestrator.interjection_turn(&question).await?;
    Ok(Json((&interjection).into()))
}

struct VoicedTurn {
    curious: Option<String>,
    user_question: Option<String>,
    explainer: String,
    script: SpeechScript,
}

async fn voiced_turn(state: &AppState, payload: AudioRequest) -> Result<VoicedTurn, ApiError> {
    let AudioRequest {
        question,
        topic,
        moderator,
    } = payload;

    match question {
        Some(user_text) => {
            let interjection = state.orchestrator.interjection_turn(&user_text).await?;
            Ok(VoicedTurn {
                curious: None,
                user_question: Some(interjection.user_text.clone()),
                explainer: interjection.explainer_answer.clone(),
                script: SpeechScript::from_interjection(&interjection).with_moderator(moderator),
            })
        }
        None => {
            let topic = topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());
            let turn = state.orchestrator.autonomous_turn(&topic).await?;
            Ok(VoicedTurn {
                curious: Some(turn.curious_question.clone()),
                user_question: None,
                explainer: turn.explainer_answer.clone(),
                script: SpeechScript::from_turn(&turn).with_moderator(moderator),
            })
        }
    }
}

/// Produce a turn with one MP3 clip per speaking role.
#[utoipa::path(
    post,
    path = "/conversation/podcast/audio",
    request_body = AudioRequest,
    responses(
        (status = 200, description = "Turn text with base64 MP3 per role; failed roles listed in audio_errors", body = AudioTurnResponse),
        (status = 400, description = "Empty topic or question", body = ErrorResponse),
        (status = 502, description = "Generation failed", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn podcast_audio(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AudioRequest>,
) -> Result<Json<AudioTurnResponse>, ApiError> {
    let voiced = voiced_turn(&state, payload).await?;

    let (audio, audio_errors) = match &state.synthesizer {
        Some(synthesizer) => {
            encode_segments(synthesize_segments(synthesizer.as_ref(), &voiced.script).await)
        }
        None => {
            warn!("Audio requested but speech synthesis is not configured");
            let failures = voiced
                .script
                .segments()
                .into_iter()
                .map(|(role, _)| AudioFailure {
                    role: role.as_str().to_string(),
                    error: SPEECH_UNAVAILABLE.to_string(),
                })
                .collect();
            (Vec::new(), failures)
        }
    };

    Ok(Json(AudioTurnResponse {
        curious: voiced.curious,
        user_question: voiced.user_question,
        answer: voiced.explainer.clone(),
        explainer: voiced.explainer,
        audio,
        audio_errors,
    }))
}

/// Produce a turn with a single MP3 recording of every role in order.
#[utoipa::path(
    post,
    path = "/conversation/podcast/combined",
    request_body = AudioRequest,
    responses(
        (status = 200, description = "Turn text with one base64 MP3, or audio_error", body = CombinedAudioResponse),
        (status = 400, description = "Empty topic or question", body = ErrorResponse),
        (status = 502, description = "Generation failed", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn podcast_combined(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AudioRequest>,
) -> Result<Json<CombinedAudioResponse>, ApiError> {
    let voiced = voiced_turn(&state, payload).await?;

    let (audio, audio_error) = match &state.synthesizer {
        Some(synthesizer) => match synthesize_combined(synthesizer.as_ref(), &voiced.script).await
        {
            Ok(mp3) => (Some(encode_audio(&mp3)), None),
            Err(e) => {
                warn!(error = ?e, "Combined audio failed, returning text only");
                (None, Some(format!("{:#}", e)))
            }
        },
        None => (None, Some(SPEECH_UNAVAILABLE.to_string())),
    };

    Ok(Json(CombinedAudioResponse {
        curious: voiced.curious,
        user_question: voiced.user_question,
        answer: voiced.explainer.clone(),
        explainer: voiced.explainer,
        audio,
        audio_error,
    }))
}

/// Produce an autonomous turn and stream the Explainer's answer as MP3.
#[utoipa::path(
    get,
    path = "/conversation/podcast/stream",
    params(StreamQuery),
    responses(
        (status = 200, description = "Explainer audio, streamed in chunks", body = Vec<u8>, content_type = "audio/mpeg"),
        (status = 400, description = "Empty topic", body = ErrorResponse),
        (status = 502, description = "Generation or speech synthesis failed", body = ErrorResponse),
        (status = 503, description = "Speech synthesis is not configured", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn podcast_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, ApiError> {
    let synthesizer = state
        .synthesizer
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable(SPEECH_UNAVAILABLE.to_string()))?;

    let topic = query.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());
    let turn = state.orchestrator.autonomous_turn(&topic).await?;

    let stream = synthesizer
        .stream(&turn.explainer_answer, Role::Explainer)
        .await
        .map_err(ApiError::BadGateway)?;
    info!("Streaming explainer audio");

    Ok((
        [(header::CONTENT_TYPE, MP3_CONTENT_TYPE)],
        Body::from_stream(stream),
    )
        .into_response())
}
