//! API handlers for the avatar kiosk server.

use crate::AppState;
use avatar_types::VoiceListResponse;
use avatar_voice::VoiceError;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;

/// Message returned when the upstream voice API rejects a request.
const UPSTREAM_ERROR_MESSAGE: &str = "LiveAvatar API error";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The upstream answered with a failure; its status and body are relayed.
    #[error("LiveAvatar API error")]
    Upstream { status: StatusCode, details: String },
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Upstream { status, body } => ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                details: body,
            },
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Upstream { status, details } => (
                status,
                serde_json::json!({
                    "error": UPSTREAM_ERROR_MESSAGE,
                    "details": details
                }),
            ),
            ApiError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Handler for `GET /api/list-voices`.
///
/// Aggregates every page of the upstream voice list.
pub async fn list_voices_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<VoiceListResponse>, ApiError> {
    match state.voices.list_voices().await {
        Ok(data) => {
            tracing::debug!(count = data.len(), "listed voices");
            Ok(Json(VoiceListResponse { data }))
        }
        Err(e) => {
            tracing::error!("error listing voices: {}", e);
            Err(e.into())
        }
    }
}
