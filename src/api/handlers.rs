use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::contracts::{MediaKind, SequenceCounter, SequenceError};
use crate::dispatch::Dispatcher;

/// Application state shared across handlers.
pub struct AppState<S: SequenceCounter> {
    pub dispatcher: Arc<Dispatcher<S>>,
}

impl<S: SequenceCounter> AppState<S> {
    pub fn new(dispatcher: Arc<Dispatcher<S>>) -> Self {
        Self { dispatcher }
    }

    fn sequence_response(&self, next: u64) -> SequenceResponse {
        SequenceResponse {
            next,
            formatted: self.dispatcher.transformer().format_sequence(next),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// API error type.
pub enum ApiError {
    Sequence(SequenceError),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_response) = match self {
            ApiError::Sequence(SequenceError::InvalidArgument(msg)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: msg,
                    code: "INVALID_ARGUMENT".into(),
                },
            ),
            ApiError::Sequence(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: e.to_string(),
                    code: "SEQUENCE_ERROR".into(),
                },
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: msg,
                    code: "BAD_REQUEST".into(),
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<SequenceError> for ApiError {
    fn from(e: SequenceError) -> Self {
        ApiError::Sequence(e)
    }
}

/// GET /health
/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy"
    }))
}

/// Response for stats endpoint.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_secs: f64,
    pub mode: &'static str,
    pub next_sequence: u64,
    pub dispatch: DispatchStats,
    pub messages_by_kind: BTreeMap<&'static str, u64>,
}

#[derive(Debug, Serialize)]
pub struct DispatchStats {
    pub sequences_issued: u64,
    pub transformed: u64,
    pub cleared: u64,
    pub skipped: u64,
    pub edits: u64,
    pub resends: u64,
    pub apply_failures: u64,
    pub sequence_errors: u64,
    pub avg_apply_latency_ms: f64,
}

/// GET /stats
/// Dispatch counters and the current sequence position.
pub async fn get_stats<S: SequenceCounter>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let dispatcher = &state.dispatcher;
    let metrics = dispatcher.metrics();
    let next_sequence = dispatcher.counter().current()?;

    Ok(Json(StatsResponse {
        uptime_secs: metrics.uptime_secs(),
        mode: dispatcher.transformer().mode().name(),
        next_sequence,
        dispatch: DispatchStats {
            sequences_issued: metrics.sequences_issued_total.load(Ordering::Relaxed),
            transformed: metrics.transformed_total.load(Ordering::Relaxed),
            cleared: metrics.cleared_total.load(Ordering::Relaxed),
            skipped: metrics.skipped_total.load(Ordering::Relaxed),
            edits: metrics.edits_total.load(Ordering::Relaxed),
            resends: metrics.resends_total.load(Ordering::Relaxed),
            apply_failures: metrics.apply_failures_total.load(Ordering::Relaxed),
            sequence_errors: metrics.sequence_errors_total.load(Ordering::Relaxed),
            avg_apply_latency_ms: metrics.apply_latency_ms.mean_ms(),
        },
        messages_by_kind: metrics.messages_by_kind().into_iter().collect(),
    }))
}

/// GET /metrics
/// Returns metrics in Prometheus text exposition format.
pub async fn metrics<S: SequenceCounter>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    let dispatcher = &state.dispatcher;
    let mut output = dispatcher.metrics().format_prometheus();

    match dispatcher.counter().current() {
        Ok(next) => {
            output.push_str(&format!(
                "# HELP captioner_next_sequence Next sequence number to be issued\n\
                 # TYPE captioner_next_sequence gauge\n\
                 captioner_next_sequence {}\n",
                next
            ));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read sequence for metrics");
        }
    }

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        output,
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SequenceResponse {
    pub next: u64,
    /// `next` in the configured numbering style.
    pub formatted: String,
}

/// GET /sequence
pub async fn get_sequence<S: SequenceCounter>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<SequenceResponse>, ApiError> {
    let next = state.dispatcher.counter().current()?;
    Ok(Json(state.sequence_response(next)))
}

/// POST /sequence/reset
/// Restarts numbering at 1.
pub async fn reset_sequence<S: SequenceCounter>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<SequenceResponse>, ApiError> {
    let next = state.dispatcher.counter().reset()?;
    tracing::info!("Sequence reset to {}", next);
    Ok(Json(state.sequence_response(next)))
}

#[derive(Debug, Deserialize)]
pub struct SetSequenceRequest {
    pub value: i64,
}

/// PUT /sequence
/// Sets the next number to hand out.
pub async fn set_sequence<S: SequenceCounter>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<SetSequenceRequest>,
) -> Result<Json<SequenceResponse>, ApiError> {
    let next = state.dispatcher.counter().set(req.value)?;
    tracing::info!("Sequence set to {}", next);
    Ok(Json(state.sequence_response(next)))
}

/// Request body for preparing a caption.
#[derive(Debug, Deserialize)]
pub struct PrepareCaptionRequest {
    /// `video`, `audio`, `photo`, `animation`, `document`; anything else is
    /// treated as unknown media.
    pub media_kind: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PrepareCaptionResponse {
    Skip,
    Apply {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sequence: Option<u64>,
    },
}

/// POST /captions
/// Routes a media event and returns the caption to apply. A transformed
/// caption consumes a sequence number.
pub async fn prepare_caption<S: SequenceCounter>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PrepareCaptionRequest>,
) -> Result<Json<PrepareCaptionResponse>, ApiError> {
    if req.media_kind.trim().is_empty() {
        return Err(ApiError::BadRequest("media_kind must not be empty".into()));
    }

    let kind = MediaKind::from_parts(&req.media_kind, req.mime_type);
    let prepared = state
        .dispatcher
        .prepare(&kind, req.caption.as_deref())?;

    Ok(Json(match prepared {
        Some(p) => PrepareCaptionResponse::Apply {
            text: p.result.into_text(),
            sequence: p.sequence,
        },
        None => PrepareCaptionResponse::Skip,
    }))
}
