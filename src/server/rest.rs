//! REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};

use super::app::ServerState;
use super::ws::status_frame;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Manual announcement request body.
#[derive(Debug, Deserialize)]
pub struct AnnounceRequest {
    pub message: String,
}

/// Create REST API router.
pub fn create_rest_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/v1/status", get(status))
        .route("/api/v1/announce", post(announce))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// Prometheus metrics endpoint.
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; charset=utf-8",
            )],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(
                    axum::http::header::CONTENT_TYPE,
                    "text/plain; charset=utf-8",
                )],
                b"Failed to encode metrics".to_vec(),
            )
        }
    }
}

/// Status endpoint: retained world state, uptime and a status line.
async fn status(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let frame = status_frame(&state).await;
    let connections = state.hub.connection_count();

    tracing::debug!(connections, "Status retrieved");

    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "connections": connections,
        "reply": frame,
    }))
}

/// Broadcast a manual announcement immediately.
async fn announce(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<AnnounceRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "message cannot be empty"})),
        );
    }

    tracing::info!(message = %request.message, "Manual announcement via REST");
    state.hub.publish_manual(&request.message).await;

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"delivered": true})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::BroadcastHub;
    use crate::snapshot::shared_world;

    fn test_state() -> Arc<ServerState> {
        Arc::new(ServerState::new(BroadcastHub::new(), shared_world()))
    }

    #[tokio::test]
    async fn test_announce_broadcasts_manual_event() {
        let state = test_state();
        let mut rx = state.hub.subscribe();

        let response = announce(
            State(Arc::clone(&state)),
            Json(AnnounceRequest {
                message: "raid tonight at 8".to_string(),
            }),
        )
        .await;
        assert_eq!(response.0, StatusCode::ACCEPTED);

        let frame = rx.recv().await.unwrap();
        assert!(frame.contains("\"event_type\":\"manual\""));
        assert!(frame.contains("raid tonight at 8"));
    }

    #[tokio::test]
    async fn test_announce_rejects_empty_message() {
        let state = test_state();
        let response = announce(
            State(state),
            Json(AnnounceRequest {
                message: "   ".to_string(),
            }),
        )
        .await;
        assert_eq!(response.0, StatusCode::BAD_REQUEST);
    }
}
