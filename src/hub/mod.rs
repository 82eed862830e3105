//! Event fan-out to attached consumers.
//!
//! This module provides:
//! - The tagged wire protocol shared by origin and relay
//! - `BroadcastHub`: serialize-once fan-out plus the bounded
//!   recent-events ring and greeting construction

mod protocol;

pub use protocol::{ClientRequest, EventRecord, OutboundMessage};

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use crate::events::SemanticEvent;
use crate::snapshot::WorldState;

/// Fan-out channel capacity. A consumer lagging by more than this many
/// frames skips ahead to the newest frame.
const BROADCAST_CAPACITY: usize = 256;

/// Bounded capacity of the recent-events ring (newest first).
pub const RECENT_EVENTS_CAPACITY: usize = 20;

/// Fan-out of events and state to all attached consumer connections.
///
/// Frames are serialized once and broadcast as JSON text; connections
/// attach by subscribing and are lazily dropped when their receiver
/// goes away. Slow consumers get no back-pressure beyond the channel
/// capacity, which is acceptable at this system's fan-out sizes.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<String>,
    recent: Arc<RwLock<VecDeque<EventRecord>>>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    /// Create a hub with no attached consumers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            recent: Arc::new(RwLock::new(VecDeque::with_capacity(
                RECENT_EVENTS_CAPACITY,
            ))),
        }
    }

    /// Attach a consumer: returns the frame stream for one connection.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Number of currently attached consumers.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Serialize a frame once and send it to every attached consumer.
    pub fn send(&self, frame: &OutboundMessage) {
        match serde_json::to_string(frame) {
            Ok(json) => {
                // Err here just means no consumers are attached.
                let _ = self.tx.send(json);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize outbound frame"),
        }
    }

    /// Forward an already serialized frame verbatim (relay path).
    pub fn send_raw(&self, json: &str) {
        let _ = self.tx.send(json.to_string());
    }

    /// Publish an accepted game event with the current world state.
    pub async fn publish_event(&self, event: &SemanticEvent, world: Option<WorldState>) {
        let record = EventRecord::from_event(event, Utc::now());
        self.remember(record.clone()).await;
        self.send(&OutboundMessage::GameEvent {
            event_type: event.kind,
            message: event.message.clone(),
            timestamp: record.timestamp,
            world_state: world,
            data: event.data.clone(),
        });
    }

    /// Publish an operator announcement. Bypasses the event gate by
    /// construction: manual input is always delivered.
    pub async fn publish_manual(&self, message: &str) {
        let record = EventRecord {
            event_type: crate::events::EventKind::Manual,
            message: message.to_string(),
            timestamp: Utc::now(),
        };
        self.remember(record.clone()).await;
        self.send(&OutboundMessage::GameEvent {
            event_type: record.event_type,
            message: record.message,
            timestamp: record.timestamp,
            world_state: None,
            data: None,
        });
    }

    /// Publish an ungated file-changed notification for a flushed batch.
    pub fn publish_file_changed(&self, paths: &[PathBuf]) {
        self.send(&OutboundMessage::FileChanged {
            paths: paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            timestamp: Utc::now(),
        });
    }

    /// Publish a synthetic upstream-connectivity notification.
    pub fn publish_observer_status(&self, connected: bool) {
        self.send(&OutboundMessage::ObserverStatus {
            connected,
            timestamp: Utc::now(),
        });
    }

    /// Record an event in the bounded ring (newest first).
    pub async fn remember(&self, record: EventRecord) {
        let mut recent = self.recent.write().await;
        recent.push_front(record);
        recent.truncate(RECENT_EVENTS_CAPACITY);
    }

    /// Replace the ring contents wholesale (relay mirroring).
    pub async fn replace_recent(&self, records: Vec<EventRecord>) {
        let mut recent = self.recent.write().await;
        recent.clear();
        recent.extend(records.into_iter().take(RECENT_EVENTS_CAPACITY));
    }

    /// Snapshot of the ring, newest first.
    pub async fn recent_events(&self) -> Vec<EventRecord> {
        self.recent.read().await.iter().cloned().collect()
    }

    /// Build the greeting frame sent to a freshly attached consumer.
    pub async fn greeting(&self, message: String, world: &WorldState) -> OutboundMessage {
        OutboundMessage::Greeting {
            message,
            timestamp: Utc::now(),
            world_state: world.has_parsed().then(|| world.clone()),
            recent_events: self.recent_events().await,
        }
    }
}
