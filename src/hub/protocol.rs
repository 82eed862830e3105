//! Tagged wire protocol shared by the origin observer and relays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{EventKind, SemanticEvent};
use crate::snapshot::WorldState;

/// One entry in the bounded recent-events ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event kind.
    pub event_type: EventKind,
    /// Human-readable message.
    pub message: String,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Build a record from an accepted semantic event.
    #[must_use]
    pub fn from_event(event: &SemanticEvent, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: event.kind,
            message: event.message.clone(),
            timestamp,
        }
    }
}

/// Push-channel frames, origin -> consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// First frame on every new connection: current state plus a
    /// bounded window of recent events, newest first.
    Greeting {
        message: String,
        timestamp: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        world_state: Option<WorldState>,
        #[serde(default)]
        recent_events: Vec<EventRecord>,
    },
    /// An accepted semantic event (`event_type: "manual"` for operator
    /// announcements, which bypass the cooldown gate).
    GameEvent {
        event_type: EventKind,
        message: String,
        timestamp: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        world_state: Option<WorldState>,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    /// Ungated notification that a coalesced batch of save files was
    /// flushed.
    FileChanged {
        paths: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    /// Synthetic relay-layer notification: upstream connectivity
    /// changed.
    ObserverStatus {
        connected: bool,
        timestamp: DateTime<Utc>,
    },
    /// Reply to a status query on the same connection.
    Status {
        #[serde(skip_serializing_if = "Option::is_none")]
        world_state: Option<WorldState>,
        uptime_secs: u64,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

/// Requests a consumer may send over its push connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Ask for the current retained world state and a status line.
    Status,
    /// Broadcast free text immediately, bypassing the cooldown gate.
    Announce { message: String },
}
