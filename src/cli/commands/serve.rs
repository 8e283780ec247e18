//! HTTP API server for integration with other systems.
//!
//! Exposes script generation over REST. Each request owns its tool-provider
//! process, which is killed if the client goes away mid-generation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::{ErrorKind, GenerationError};
use crate::script::ScriptGenerator;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    generator: ScriptGenerator,
    shutdown: CancellationToken,
}

/// Run the HTTP API server until `shutdown` fires.
pub async fn run_serve(
    host: &str,
    port: u16,
    settings: Settings,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let generator = ScriptGenerator::from_settings(&settings)?;
    let app = router(generator, shutdown.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Podcraft API Server");
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Health", "GET  /health");
    Output::kv("Generate", "POST /api/generate");
    Output::kv("Research", &settings.research.mode.to_string());
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}

fn router(generator: ScriptGenerator, shutdown: CancellationToken) -> Router {
    let state = Arc::new(AppState {
        generator,
        shutdown,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct GenerateRequest {
    topic: String,
    #[serde(default)]
    duration_minutes: Option<u32>,
}

#[derive(Serialize)]
struct GenerateResponse {
    topic: String,
    duration_minutes: u32,
    script: String,
    word_count: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: ErrorKind,
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        let status = match self.kind {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.message,
                kind: self.kind,
            }),
        )
            .into_response()
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, GenerationError> {
    let cancel = state.shutdown.child_token();
    let generated = state
        .generator
        .generate(&req.topic, req.duration_minutes, &cancel)
        .await
        .inspect_err(|e| warn!(kind = %e.kind, error = %e.message, "Generation request failed"))?;

    Ok(Json(GenerateResponse {
        topic: generated.topic,
        duration_minutes: generated.duration_minutes,
        script: generated.script,
        word_count: generated.word_count,
    }))
}
