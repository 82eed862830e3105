//! Upstream relay client.
//!
//! A relay is a secondary process that attaches to another observer's
//! push channel as a consumer, mirrors its retained state, and
//! re-exposes everything through its own hub. The connection policy is
//! deliberately "never give up": a fixed reconnect delay, no backoff
//! growth, no retry cap, because the relay is a long-running companion
//! process whose upstream may restart at any time.

use std::time::Duration;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::RelayError;
use crate::hub::{BroadcastHub, EventRecord, OutboundMessage};
use crate::server::metrics;
use crate::snapshot::SharedWorld;

/// Mirrors one upstream observer into a local hub.
///
/// Lifecycle: Disconnected -> Connecting -> Connected -> Disconnected
/// (on close or error) -> Connecting (after the fixed delay), forever.
pub struct RelayClient {
    url: String,
    reconnect_delay: Duration,
    hub: BroadcastHub,
    world: SharedWorld,
}

impl RelayClient {
    /// Create a relay client for the given upstream WebSocket URL.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        reconnect_delay: Duration,
        hub: BroadcastHub,
        world: SharedWorld,
    ) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
            hub,
            world,
        }
    }

    /// Run the reconnect loop forever.
    ///
    /// Exactly one `observer_status{connected:true}` is published per
    /// successful connect and exactly one
    /// `observer_status{connected:false}` per loss of an established
    /// connection; failed connection attempts publish nothing.
    pub async fn run(self) {
        loop {
            tracing::info!(url = %self.url, "Connecting to upstream observer");
            metrics::RELAY_CONNECTS.inc();

            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    tracing::info!("Upstream observer connected");
                    self.hub.publish_observer_status(true);

                    self.mirror(stream).await;

                    tracing::warn!("Upstream observer connection lost");
                    self.hub.publish_observer_status(false);
                }
                Err(e) => {
                    let err = RelayError::Connect {
                        url: self.url.clone(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(error = %err, "Upstream connection failed");
                }
            }

            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// Consume frames until the stream closes or errors.
    async fn mirror(&self, mut stream: WebSocketStream<MaybeTlsStream<TcpStream>>) {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Err(e) = self.handle_frame(text.as_str()).await {
                        // One bad frame never tears the connection down.
                        tracing::warn!(error = %e, "Dropping malformed upstream message");
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!("Upstream sent close");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Upstream read error");
                    break;
                }
            }
        }
    }

    /// Mirror one upstream frame and re-publish it verbatim.
    ///
    /// State-carrying frames overwrite the local retained state
    /// wholesale, never field-by-field. Event-shaped frames are
    /// appended to the local recent-events ring. Forwarding applies no
    /// second cooldown gate.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Decode`] for undecodable payloads; the
    /// frame is dropped and nothing is forwarded.
    pub async fn handle_frame(&self, text: &str) -> Result<(), RelayError> {
        let frame: OutboundMessage =
            serde_json::from_str(text).map_err(|e| RelayError::Decode(e.to_string()))?;

        match frame {
            OutboundMessage::Greeting {
                world_state,
                recent_events,
                ..
            } => {
                if let Some(world) = world_state {
                    *self.world.write().await = world;
                }
                self.hub.replace_recent(recent_events).await;
            }
            OutboundMessage::GameEvent {
                event_type,
                message,
                timestamp,
                world_state,
                ..
            } => {
                if let Some(world) = world_state {
                    *self.world.write().await = world;
                }
                self.hub
                    .remember(EventRecord {
                        event_type,
                        message,
                        timestamp,
                    })
                    .await;
            }
            OutboundMessage::FileChanged { .. }
            | OutboundMessage::ObserverStatus { .. }
            | OutboundMessage::Status { .. } => {}
        }

        self.hub.send_raw(text);
        Ok(())
    }
}
