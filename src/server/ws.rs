//! WebSocket push channel for attached consumers.
//!
//! Clients connect to `GET /ws`, immediately receive a greeting frame
//! carrying the retained world state and recent events, and then see
//! every frame the hub publishes. Over the same socket clients may send
//! status queries (answered on that socket only) and manual
//! announcements (broadcast to everyone, bypassing the cooldown gate).
//!
//! If a client falls behind the broadcast channel, lagged frames are
//! silently skipped and the client resumes from the newest frame.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::Utc;

use super::app::ServerState;
use super::metrics;
use crate::events::flavor;
use crate::hub::{ClientRequest, OutboundMessage};

/// Upgrade an HTTP request to a WebSocket connection and attach it to
/// the hub.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle the connection lifecycle: greeting, then fan-out plus
/// request handling until the client goes away.
async fn handle_socket(mut socket: WebSocket, state: Arc<ServerState>) {
    tracing::debug!("Consumer attached");
    metrics::CONNECTED_CLIENTS.inc();

    // Subscribe before the greeting so no frame published in between
    // is lost.
    let mut rx = state.hub.subscribe();

    let greeting = {
        let world = state.world.read().await;
        let message = flavor::greeting_message(&mut rand::thread_rng());
        state.hub.greeting(message, &world).await
    };
    if send_frame(&mut socket, &greeting).await.is_err() {
        metrics::CONNECTED_CLIENTS.dec();
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        if socket.send(Message::Text(frame.into())).await.is_err() {
                            tracing::debug!("Consumer disconnected (send failed)");
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::debug!(skipped = n, "Consumer lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        tracing::debug!("Hub closed, shutting down connection");
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_request(&state, &mut socket, text.as_str()).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!("Consumer detached");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    metrics::CONNECTED_CLIENTS.dec();
}

/// Dispatch one inbound client request. Malformed requests are logged
/// and ignored; the connection stays open.
async fn handle_request(state: &Arc<ServerState>, socket: &mut WebSocket, text: &str) {
    match serde_json::from_str::<ClientRequest>(text) {
        Ok(ClientRequest::Status) => {
            let reply = status_frame(state).await;
            let _ = send_frame(socket, &reply).await;
        }
        Ok(ClientRequest::Announce { message }) => {
            tracing::info!(%message, "Manual announcement");
            state.hub.publish_manual(&message).await;
        }
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed client request");
        }
    }
}

/// Build the reply to a status query.
pub(super) async fn status_frame(state: &ServerState) -> OutboundMessage {
    let world = state.world.read().await;
    let message = flavor::status_message(&mut rand::thread_rng(), &world);
    OutboundMessage::Status {
        world_state: world.has_parsed().then(|| world.clone()),
        uptime_secs: state.uptime_secs(),
        message,
        timestamp: Utc::now(),
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &OutboundMessage) -> Result<(), ()> {
    let json = serde_json::to_string(frame).map_err(|e| {
        tracing::warn!(error = %e, "Failed to serialize frame");
    })?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
