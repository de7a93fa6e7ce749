//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the conversation endpoints and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        AudioFailure, AudioRequest, AudioSegment, AudioTurnResponse, AutonomousTurnResponse,
        CombinedAudioResponse, ConversationRequest, EpisodeTurnResponse, ErrorResponse,
        HealthResponse, InterjectionResponse, PodcastRequest, PodcastResponse,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::podcast,
        handlers::converse,
        handlers::podcast_audio,
        handlers::podcast_combined,
        handlers::podcast_stream,
    ),
    components(
        schemas(
            PodcastRequest, ConversationRequest, AudioRequest, PodcastResponse,
            AutonomousTurnResponse, InterjectionResponse, EpisodeTurnResponse,
            AudioTurnResponse, CombinedAudioResponse, AudioSegment, AudioFailure,
            HealthResponse, ErrorResponse
        )
    ),
    tags(
        (name = "Podcast API", description = "Two-host podcast dialogue grounded in a semantic index")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/", get(handlers::health))
        .route("/conversation/", post(handlers::converse))
        .route("/conversation/podcast", post(handlers::podcast))
        .route("/conversation/podcast/audio", post(handlers::podcast_audio))
        .route(
            "/conversation/podcast/combined",
            post(handlers::podcast_combined),
        )
        .route(
            "/conversation/podcast/stream",
            get(handlers::podcast_stream),
        )
        .with_state(app_state);

    // Swagger UI needs no state, so it is merged in after the stateful routes.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
