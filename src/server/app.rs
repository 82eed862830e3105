//! Main application server.
//!
//! Provides the complete server application with signal handling
//! and graceful shutdown coordination.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rest::create_rest_router;
use super::ws::ws_handler;
use crate::hub::BroadcastHub;
use crate::snapshot::SharedWorld;
use crate::Result;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Shutdown timeout duration
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Shared state handed to every handler.
pub struct ServerState {
    /// Fan-out hub for this process.
    pub hub: BroadcastHub,
    /// Retained world state (read side).
    pub world: SharedWorld,
    /// Process start time, for uptime reporting.
    pub started: Instant,
}

impl ServerState {
    /// Create server state over an existing hub and world handle.
    #[must_use]
    pub fn new(hub: BroadcastHub, world: SharedWorld) -> Self {
        Self {
            hub,
            world,
            started: Instant::now(),
        }
    }

    /// Seconds since process start.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Application server.
pub struct App {
    config: ServerConfig,
    state: Arc<ServerState>,
}

impl App {
    /// Create a new application.
    #[must_use]
    pub fn new(config: ServerConfig, state: ServerState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Build the router with all endpoints.
    fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/ws", get(ws_handler))
            .with_state(Arc::clone(&self.state))
            .merge(create_rest_router(Arc::clone(&self.state)))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &axum::http::Request<_>| {
                        let method = request.method();
                        let uri = request.uri();
                        tracing::info_span!(
                            "http_request",
                            method = %method,
                            uri = %uri,
                        )
                    })
                    .on_response(
                        |response: &axum::response::Response,
                         _latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::debug!(
                                status = %response.status(),
                                "Request completed"
                            );
                        },
                    ),
            )
            .layer(cors)
    }

    /// Run the server until shutdown signal.
    ///
    /// The server listens for SIGTERM (Unix) and Ctrl+C signals, then
    /// gracefully shuts down all connections. Hub connections close
    /// when their tasks end; the watch and relay tasks stop with the
    /// process.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot start or encounters a
    /// fatal error during execution.
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| crate::Error::config(format!("invalid address: {e}")))?;

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            crate::error::ServerError::BindFailed {
                address: addr.to_string(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(%addr, "Server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::error::ServerError::Request(e.to_string()))?;

        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::shared_world;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_app_router_builds() {
        let state = ServerState::new(BroadcastHub::new(), shared_world());
        let app = App::new(ServerConfig::default(), state);
        let _router = app.router();
    }

    #[tokio::test]
    async fn test_uptime_starts_at_zero() {
        let state = ServerState::new(BroadcastHub::new(), shared_world());
        assert_eq!(state.uptime_secs(), 0);
    }
}
