//! HTTP surface for SnapQA.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /upload` – Accept a multipart file upload, extract and index its text, and
//!   return the generated summary (`filename`, `summary`, `chunks_indexed`).
//! - `POST /qa` – Answer a question grounded in the most recently indexed document.
//! - `GET /history` – Return the chat transcript for the current session.
//! - `POST /session/reset` – Clear the document session and the transcript.
//! - `GET /metrics` – Observe ingestion and question counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Errors serialize as `{ "error": message }`; unsupported formats map to 415, questions
//! without an indexed document to 400, and everything else to 500.

use crate::metrics::MetricsSnapshot;
use crate::processing::{ChatMessage, ProcessingApi, ProcessingError};
use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the upload and question-answering surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ProcessingApi + 'static,
{
    Router::new()
        .route("/upload", post(upload_document::<S>))
        .route("/qa", post(ask_question::<S>))
        .route("/history", get(get_history::<S>))
        .route("/session/reset", post(reset_session::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Success response for the `POST /upload` endpoint.
#[derive(Serialize)]
struct UploadResponse {
    /// Original filename of the upload.
    filename: String,
    /// Cleaned generated summary of the document.
    summary: String,
    /// Number of sentence chunks indexed.
    chunks_indexed: usize,
}

/// Accept a multipart upload, index the document, and return its summary.
///
/// The file travels in a multipart field named `file`; the format tag is derived from the
/// filename's extension, lower-cased.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: ProcessingApi,
{
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::bad_request(format!("malformed multipart body: {error}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::bad_request("file part is missing a filename"))?;
            let bytes = field.bytes().await.map_err(|error| {
                AppError::bad_request(format!("failed to read file part: {error}"))
            })?;
            upload = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::bad_request("missing multipart field 'file'"))?;
    let outcome = service.ingest_document(&filename, bytes).await?;
    tracing::info!(
        filename = outcome.filename,
        chunks = outcome.chunk_count,
        "Upload request completed"
    );
    Ok(Json(UploadResponse {
        filename: outcome.filename,
        summary: outcome.summary,
        chunks_indexed: outcome.chunk_count,
    }))
}

/// Request body for the `POST /qa` endpoint.
#[derive(Deserialize)]
struct QuestionRequest {
    /// Free-form question about the uploaded document.
    question: String,
}

/// Success response for the `POST /qa` endpoint.
#[derive(Serialize)]
struct AnswerResponse {
    /// Generated answer grounded in the retrieved document context.
    answer: String,
}

/// Answer a question against the most recently indexed document.
async fn ask_question<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<AnswerResponse>, AppError>
where
    S: ProcessingApi,
{
    let answer = service.answer_question(request.question).await?;
    Ok(Json(AnswerResponse { answer }))
}

/// Response body for `GET /history`.
#[derive(Serialize)]
struct HistoryResponse {
    messages: Vec<ChatMessage>,
}

/// Return the chat transcript for the current session.
async fn get_history<S>(State(service): State<Arc<S>>) -> Json<HistoryResponse>
where
    S: ProcessingApi,
{
    let messages = service.history_snapshot().await;
    Json(HistoryResponse { messages })
}

/// Clear the document session and the chat transcript.
async fn reset_session<S>(State(service): State<Arc<S>>) -> StatusCode
where
    S: ProcessingApi,
{
    service.reset_session().await;
    StatusCode::NO_CONTENT
}

/// Return a concise metrics snapshot with document/chunk/question counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: ProcessingApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/upload",
                description: "Upload a document (multipart field 'file'), extract and index its text, and return the generated summary. Supported extensions: pdf, docx, doc, txt, xlsx, xls, png, jpg, jpeg.",
                request_example: None,
            },
            CommandDescriptor {
                name: "qa",
                method: "POST",
                path: "/qa",
                description: "Answer a question grounded in the most recently uploaded document.",
                request_example: Some(json!({
                    "question": "What is the document about?"
                })),
            },
            CommandDescriptor {
                name: "history",
                method: "GET",
                path: "/history",
                description: "Return the chat transcript for the current session.",
                request_example: None,
            },
            CommandDescriptor {
                name: "reset_session",
                method: "POST",
                path: "/session/reset",
                description: "Clear the current document and the chat transcript.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return document, chunk, and question counters useful for observability.",
                request_example: None,
            },
        ],
    })
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(error: ProcessingError) -> Self {
        let status = match &error {
            ProcessingError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ProcessingError::DocumentNotLoaded => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}
