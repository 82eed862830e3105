//! Semantic events derived from save changes.
//!
//! This module provides:
//! - The event value type and kind enumeration
//! - Snapshot diffing into ranked events
//! - Path-based fallback classification when parsing is unavailable
//! - The global emission cooldown gate
//! - Flavor text generation

mod classify;
mod diff;
pub mod flavor;
mod gate;

pub use classify::{classify_path, select_best, SaveKind};
pub use diff::diff;
pub use gate::EventGate;

use serde::{Deserialize, Serialize};

/// Classified, human-meaningful change kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A player appeared who was not in the previous snapshot.
    NewPlayer,
    /// A previously seen player is gone from the new snapshot.
    PlayerLeft,
    /// Pal count went up.
    EntityGained,
    /// Pal count went down.
    EntityLost,
    /// A retained player's level increased.
    PlayerLeveled,
    /// A new base camp appeared.
    BaseCreated,
    /// The world save was rewritten with no more specific change.
    WorldSave,
    /// A player-directory file changed (fallback classification).
    PlayerSave,
    /// A local-data file changed (fallback classification).
    LocalSave,
    /// A metadata file changed (fallback classification).
    MetaSave,
    /// Operator-supplied announcement; exempt from the cooldown gate.
    Manual,
}

/// Priorities: lower is more newsworthy.
pub const PRIORITY_IDENTITY: u8 = 1;
pub const PRIORITY_QUANTITY: u8 = 2;
pub const PRIORITY_FALLBACK: u8 = 3;

/// A classified change between two observations.
///
/// Value type: created by the diff or fallback classifier, consumed by
/// the gate in the same cycle, retained only in the bounded
/// recent-events ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Human-readable description.
    pub message: String,
    /// Emission priority (lower = more important).
    pub priority: u8,
    /// Event-specific structured payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl SemanticEvent {
    /// Create an event without a structured payload.
    #[must_use]
    pub fn new(kind: EventKind, message: impl Into<String>, priority: u8) -> Self {
        Self {
            kind,
            message: message.into(),
            priority,
            data: None,
        }
    }

    /// Attach a structured payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        let json = serde_json::to_string(&EventKind::NewPlayer).unwrap();
        assert_eq!(json, "\"new_player\"");
        let json = serde_json::to_string(&EventKind::EntityGained).unwrap();
        assert_eq!(json, "\"entity_gained\"");
        let kind: EventKind = serde_json::from_str("\"player_save\"").unwrap();
        assert_eq!(kind, EventKind::PlayerSave);
    }

    #[test]
    fn test_event_payload_roundtrip() {
        let event = SemanticEvent::new(EventKind::EntityGained, "Pal count: 12 (+2)", 2)
            .with_data(serde_json::json!({"new_count": 12, "delta": 2}));
        let json = serde_json::to_string(&event).unwrap();
        let back: SemanticEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, EventKind::EntityGained);
        assert_eq!(back.data.unwrap()["delta"], 2);
    }
}
