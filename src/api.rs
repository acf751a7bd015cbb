//! HTTP surface for Doc Digest.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /upload` – Accept a multipart upload (PDF, image, or anything else),
//!   run it through the extraction and summarization pipeline, and return the
//!   resulting view state.
//! - `GET /document` – Return the current pipeline status and the displayed
//!   document, if one is ready.
//! - `POST /reset` – Clear the displayed document.
//! - `GET /metrics` – Observe submission counters.
//! - `GET /events` – Server-sent stream of pipeline notifications.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Pipeline failures never surface as HTTP errors on `/upload`; they arrive as
//! destructive notifications and an `idle` status, mirroring how the pipeline
//! reports them everywhere else.

use crate::config::get_config;
use crate::notify::NotificationHub;
use crate::pipeline::{PipelineApi, PipelineStatus, ProcessedDocument, SummaryLength, UploadRequest};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_util::Stream;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared handler state: the pipeline plus the notification fan-out.
pub struct AppState<S> {
    /// Pipeline implementation backing every route.
    pub pipeline: Arc<S>,
    /// Hub the SSE surface subscribes to.
    pub notifications: Arc<NotificationHub>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            notifications: self.notifications.clone(),
        }
    }
}

/// Build the HTTP router exposing the upload pipeline.
pub fn create_router<S>(pipeline: Arc<S>, notifications: Arc<NotificationHub>) -> Router
where
    S: PipelineApi + 'static,
{
    let body_limit = get_config()
        .max_upload_bytes
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
    Router::new()
        .route("/upload", post(upload_document::<S>))
        .route("/document", get(get_document::<S>))
        .route("/reset", post(reset_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/events", get(notification_events::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState {
            pipeline,
            notifications,
        })
}

/// View of the pipeline returned by `/upload` and `/document`.
#[derive(Serialize)]
struct DocumentView {
    /// Current pipeline status.
    status: PipelineStatus,
    /// Displayed document when the status is `ready`.
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<ProcessedDocument>,
}

fn document_view<S: PipelineApi>(pipeline: &S) -> DocumentView {
    DocumentView {
        status: pipeline.status(),
        document: pipeline.active_document(),
    }
}

/// Accept a multipart upload and run it through the pipeline.
///
/// The `file` field carries the upload (filename, declared content type, raw
/// bytes); an optional `summary_length` text field overrides the configured
/// default. The handler waits for the submission to finish and returns the
/// resulting view state.
async fn upload_document<S>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> Result<Json<DocumentView>, AppError>
where
    S: PipelineApi,
{
    let mut upload: Option<UploadRequest> = None;
    let mut summary_length: Option<SummaryLength> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::bad_request(format!("Malformed multipart body: {error}")))?
    {
        match field.name().unwrap_or("") {
            "summary_length" => {
                let value = field.text().await.map_err(|error| {
                    AppError::bad_request(format!("Failed to read summary_length: {error}"))
                })?;
                summary_length = Some(value.parse().map_err(|()| {
                    AppError::bad_request(format!("Unknown summary length: {value}"))
                })?);
            }
            "file" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("upload_{}.bin", Uuid::new_v4()));
                let media_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await.map_err(|error| {
                    AppError::bad_request(format!("Failed to read upload: {error}"))
                })?;
                upload = Some(UploadRequest {
                    file_name,
                    media_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => {
                tracing::debug!(field = other, "Ignoring unrecognized multipart field");
            }
        }
    }

    let upload = upload
        .ok_or_else(|| AppError::bad_request("Missing multipart field \"file\"".to_string()))?;
    let summary_length = summary_length
        .or(get_config().default_summary_length)
        .unwrap_or_default();

    state.pipeline.submit(upload, summary_length).await;
    Ok(Json(document_view(state.pipeline.as_ref())))
}

/// Return the current pipeline status and the displayed document.
async fn get_document<S>(State(state): State<AppState<S>>) -> Json<DocumentView>
where
    S: PipelineApi,
{
    Json(document_view(state.pipeline.as_ref()))
}

/// Clear the displayed document.
async fn reset_document<S>(State(state): State<AppState<S>>) -> StatusCode
where
    S: PipelineApi,
{
    state.pipeline.reset();
    StatusCode::OK
}

/// Return a concise metrics snapshot with submission counters.
async fn get_metrics<S>(State(state): State<AppState<S>>) -> Response
where
    S: PipelineApi,
{
    Json(state.pipeline.metrics_snapshot()).into_response()
}

/// Stream pipeline notifications to the client as server-sent events.
///
/// Each notification is one `notification` event carrying its JSON encoding.
/// A comment heartbeat keeps idle connections alive; a lagging client misses
/// dropped entries rather than stalling the pipeline.
async fn notification_events<S>(
    State(state): State<AppState<S>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: PipelineApi,
{
    let mut rx = state.notifications.subscribe();
    tracing::debug!("New SSE notification subscriber");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(notification) => match Event::default().event("notification").json_data(&notification) {
                    Ok(event) => yield Ok(event),
                    Err(error) => {
                        tracing::warn!(error = %error, "Failed to encode notification event");
                    }
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "SSE subscriber lagged; notifications dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
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
                description: "Multipart upload of one document. The \"file\" field carries the bytes; an optional \"summary_length\" field (short | medium | long) overrides the configured default. Response returns { \"status\": string, \"document\"?: object }.",
                request_example: Some(json!({
                    "file": "<multipart file field>",
                    "summary_length": "medium"
                })),
            },
            CommandDescriptor {
                name: "document",
                method: "GET",
                path: "/document",
                description: "Return the current pipeline status and, when ready, the processed document.",
                request_example: None,
            },
            CommandDescriptor {
                name: "reset",
                method: "POST",
                path: "/reset",
                description: "Clear the displayed document and return the pipeline to idle.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return submission counters useful for observability dashboards.",
                request_example: None,
            },
            CommandDescriptor {
                name: "events",
                method: "GET",
                path: "/events",
                description: "Server-sent stream of pipeline notifications (info and failure toasts).",
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
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
