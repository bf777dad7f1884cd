//! HTTP request handlers for the chat and extraction service.
//!
//! Request bodies are parsed by hand rather than through `Json<T>` so that
//! malformed JSON and a missing message get distinct, stable error bodies.

use crate::request::{lookup_message, CHAT_MESSAGE_KEYS, EXTRACT_MESSAGE_KEYS};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use projectbrain_domain::traits::{DocumentRetriever, LlmProvider};
use projectbrain_extractor::{ChatResponse, ExtractResponse, PipelineError, RagPipeline};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Answer returned when the chat pipeline fails
pub const CHAT_FALLBACK_ANSWER: &str =
    "Sorry, the backend encountered an error processing your request.";

/// Shared application state
pub struct AppState<L, R> {
    /// Retrieval + LLM pipeline
    pub pipeline: Arc<RagPipeline<L, R>>,
}

impl<L, R> AppState<L, R> {
    /// Wrap a pipeline for sharing across requests
    pub fn new(pipeline: RagPipeline<L, R>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

// Derived Clone would require L: Clone and R: Clone
impl<L, R> Clone for AppState<L, R> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "Online" while the process serves requests
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Body is not valid JSON
    InvalidJson,
    /// None of the accepted keys holds a non-blank string
    MissingMessage(&'static str),
    /// Message exceeds the configured length
    QueryTooLong(usize, usize),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidJson => (StatusCode::BAD_REQUEST, "Invalid JSON".to_string()),
            AppError::MissingMessage(hint) => (StatusCode::UNPROCESSABLE_ENTITY, hint.to_string()),
            AppError::QueryTooLong(len, max) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Message too long: {} characters (max {})", len, max),
            ),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

fn read_message(body: &[u8], keys: &[&str], hint: &'static str) -> Result<String, AppError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| AppError::InvalidJson)?;
    lookup_message(&value, keys)
        .map(str::to_string)
        .ok_or(AppError::MissingMessage(hint))
}

/// GET / - Liveness probe
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Online".to_string(),
    })
}

/// POST /chat - Answer a question from the documents
///
/// Pipeline failures still return 200 with an apology so chat clients can
/// render something.
async fn chat<L, R>(
    State(state): State<AppState<L, R>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, AppError>
where
    L: LlmProvider + Send + Sync + 'static,
    R: DocumentRetriever + Send + Sync + 'static,
    L::Error: Display,
    R::Error: Display,
{
    let message = read_message(
        &body,
        CHAT_MESSAGE_KEYS,
        "No message found. Send JSON with a 'message' key.",
    )?;

    match state.pipeline.answer(&message).await {
        Ok(response) => Ok(Json(response)),
        Err(PipelineError::QueryTooLong(len, max)) => Err(AppError::QueryTooLong(len, max)),
        Err(e) => {
            error!(error = %e, "Chat request failed");
            Ok(Json(ChatResponse {
                answer: CHAT_FALLBACK_ANSWER.to_string(),
                sources: Vec::new(),
            }))
        }
    }
}

/// POST /extract - Extract a table from the documents
///
/// Pipeline failures return 200 with an empty table.
async fn extract<L, R>(
    State(state): State<AppState<L, R>>,
    body: Bytes,
) -> Result<Json<ExtractResponse>, AppError>
where
    L: LlmProvider + Send + Sync + 'static,
    R: DocumentRetriever + Send + Sync + 'static,
    L::Error: Display,
    R::Error: Display,
{
    let message = read_message(
        &body,
        EXTRACT_MESSAGE_KEYS,
        "No command found. Send JSON with a 'message' key.",
    )?;

    match state.pipeline.extract(&message).await {
        Ok(response) => {
            for warning in &response.warnings {
                warn!(%warning, "Extraction warning");
            }
            Ok(Json(response))
        }
        Err(PipelineError::QueryTooLong(len, max)) => Err(AppError::QueryTooLong(len, max)),
        Err(e) => {
            error!(error = %e, "Extraction request failed");
            Ok(Json(ExtractResponse::empty()))
        }
    }
}

/// Create the axum router with all routes
///
/// `/api/*` paths are aliases kept for older frontends.
pub fn create_router<L, R>(state: AppState<L, R>) -> AxumRouter
where
    L: LlmProvider + Send + Sync + 'static,
    R: DocumentRetriever + Send + Sync + 'static,
    L::Error: Display,
    R::Error: Display,
{
    AxumRouter::new()
        .route("/", get(health_check))
        .route("/chat", post(chat::<L, R>))
        .route("/api/chat", post(chat::<L, R>))
        .route("/extract", post(extract::<L, R>))
        .route("/api/extract", post(extract::<L, R>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
