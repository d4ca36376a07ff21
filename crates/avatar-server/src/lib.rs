//! HTTP surface of the avatar kiosk.
//!
//! Two routes: `GET /health` and `GET /api/list-voices`, the latter backed by
//! a [`VoiceCatalogClient`] built from the `[liveavatar]` config section.

pub mod api;
pub mod config;

use avatar_voice::{UpstreamConfig, VoiceCatalogClient, VoiceError};
use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug)]
pub struct AppState {
    pub voices: Arc<VoiceCatalogClient>,
}

impl AppState {
    /// Builds the upstream client. A missing API key is allowed but logged,
    /// since every listing will then be rejected upstream.
    pub fn new(upstream: UpstreamConfig) -> Result<Self, VoiceError> {
        let client = VoiceCatalogClient::new(upstream)?;
        if !client.is_configured() {
            tracing::warn!(
                api_url = %client.config().api_url,
                "no LiveAvatar API key configured"
            );
        }
        Ok(Self {
            voices: Arc::new(client),
        })
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The kiosk page may be served from another origin.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/list-voices", get(api::list_voices_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .layer(Extension(Arc::new(state)))
}
