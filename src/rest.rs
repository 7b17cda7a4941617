// Copyright 2026 Placelens Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API for Placelens.
//!
//! Thin mapping from HTTP to the diagnosis services: the pipeline owns all
//! behavior, handlers only validate input, translate the error taxonomy to
//! status codes, and attach request-scoped debug data.

use crate::error::DiagnosisError;
use crate::pipeline::PlaceDiagnoser;
use crate::resolver;
use crate::social::SocialDiagnoser;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared state passed to request handlers.
pub struct AppState {
    pub place: Arc<PlaceDiagnoser>,
    pub social: Arc<SocialDiagnoser>,
    /// Whether a real browser backs the place pipeline.
    pub browser_available: bool,
}

/// Build the axum Router with all REST endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/diagnosis/place", post(handle_place))
        .route("/diagnosis/social", get(handle_social))
        .layer(cors)
        .with_state(state)
}

/// Start the REST API server on the given port.
pub async fn start(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    info!("REST API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "browser_available": state.browser_available,
    }))
}

#[derive(Deserialize)]
struct PlaceRequest {
    #[serde(default)]
    url: String,
}

async fn handle_place(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlaceRequest>,
) -> (StatusCode, Json<Value>) {
    // Reject before pipeline entry: empty input or a host the listing
    // platform does not own.
    let normalized = resolver::normalize_url(&body.url);
    if normalized.is_empty() || !resolver::is_supported_host(&normalized) {
        return error_response(&DiagnosisError::InvalidUrl);
    }

    match state.place.diagnose(&body.url).await {
        Ok(outcome) => {
            let debug = json!({
                "input_url": outcome.target.input_url,
                "normalized_url": outcome.target.normalized_url,
                "final_url": outcome.target.final_url,
                "candidates": outcome.candidates,
                "cache_hit": outcome.cache_hit,
                "elapsed_ms": outcome.elapsed_ms,
            });
            // The diagnosis result spreads into the response top level with
            // the debug context alongside it.
            let mut response = serde_json::to_value(&outcome.result)
                .unwrap_or_else(|_| json!({}));
            if let Some(obj) = response.as_object_mut() {
                obj.insert("ok".to_string(), json!(true));
                obj.insert("debug".to_string(), debug);
            }
            (StatusCode::OK, Json(response))
        }
        Err(e) => error_response(&e),
    }
}

#[derive(Deserialize)]
struct SocialRequest {
    #[serde(default)]
    handle: String,
}

async fn handle_social(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SocialRequest>,
) -> (StatusCode, Json<Value>) {
    match state.social.diagnose(&params.handle).await {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "data": result })),
        ),
        Err(e) => error_response(&e),
    }
}

/// Map a taxonomy error to its HTTP shape. The primary message is the stable
/// human-readable explanation; raw internal detail rides in `debug` only.
fn error_response(e: &DiagnosisError) -> (StatusCode, Json<Value>) {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut body = json!({
        "ok": false,
        "error": { "code": e.code(), "message": e.to_string() },
    });
    if let Some(detail) = e.detail() {
        body["debug"] = json!({ "detail": detail });
    }
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shapes() {
        let (status, Json(body)) = error_response(&DiagnosisError::InvalidUrl);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_URL");
        assert_eq!(body["ok"], false);
        assert!(body.get("debug").is_none());

        let (status, Json(body)) = error_response(&DiagnosisError::Timeout);
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"]["code"], "TIMEOUT");

        let (status, Json(body)) = error_response(&DiagnosisError::ScrapeFailed {
            detail: "nav refused".into(),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["debug"]["detail"], "nav refused");
        // Internal detail never becomes the primary message.
        assert_ne!(body["error"]["message"], "nav refused");

        let (status, _) = error_response(&DiagnosisError::NotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
