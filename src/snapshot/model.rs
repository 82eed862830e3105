//! Snapshot and retained world state types.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A player observed in a save file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player display name (identity key for diffing).
    pub name: String,
    /// Player level, when the parser reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Whether this player is the world host.
    #[serde(default)]
    pub is_host: bool,
}

impl Player {
    /// Create a player with just a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: None,
            is_host: false,
        }
    }
}

/// Point-in-time extraction of world state from a save file.
///
/// Produced only by a [`super::SnapshotProvider`]; immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Players present in the save.
    pub players: Vec<Player>,
    /// Number of pals (creature entities) in the world.
    pub pal_count: u32,
    /// Number of base camps in the world.
    pub base_count: u32,
    /// World identifier extracted from the save path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_id: Option<String>,
    /// Name of the hosting player, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_player: Option<String>,
    /// When this snapshot was captured.
    pub timestamp: DateTime<Utc>,
}

/// The process's running memory of "what we last knew" about the world.
///
/// Initialized empty at startup. At the origin it is overwritten from
/// each successfully diffed snapshot; at a relay it is overwritten
/// wholesale from each relayed payload, never merged field-by-field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldState {
    /// Players last observed (deduplicated by name).
    pub players: Vec<Player>,
    /// Last observed pal count.
    pub pal_count: u32,
    /// Last observed base count.
    pub base_count: u32,
    /// World identifier, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_id: Option<String>,
    /// Hosting player, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_player: Option<String>,
    /// Timestamp of the last successful parse. `None` until the first
    /// snapshot lands, which is what suppresses first-observation noise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_parsed: Option<DateTime<Utc>>,
}

impl WorldState {
    /// Create an empty retained state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite all comparable fields from a snapshot and stamp the
    /// parse time. Players are deduplicated by name, first occurrence
    /// wins.
    pub fn apply(&mut self, snapshot: &WorldSnapshot) {
        let mut players: Vec<Player> = Vec::with_capacity(snapshot.players.len());
        for p in &snapshot.players {
            if !players.iter().any(|q| q.name == p.name) {
                players.push(p.clone());
            }
        }
        self.players = players;
        self.pal_count = snapshot.pal_count;
        self.base_count = snapshot.base_count;
        self.world_id.clone_from(&snapshot.world_id);
        self.host_player.clone_from(&snapshot.host_player);
        self.last_parsed = Some(snapshot.timestamp);
    }

    /// Look up a retained player by name.
    #[must_use]
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Whether at least one snapshot has been applied.
    #[must_use]
    pub fn has_parsed(&self) -> bool {
        self.last_parsed.is_some()
    }
}

/// Shared handle to the retained world state.
///
/// Constructed once at startup and passed to the components that need
/// it (diff step writes, greeting/status paths read). Components run on
/// separate tokio tasks, hence the lock.
pub type SharedWorld = Arc<RwLock<WorldState>>;

/// Create a fresh shared world state handle.
#[must_use]
pub fn shared_world() -> SharedWorld {
    Arc::new(RwLock::new(WorldState::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(players: &[&str], pals: u32) -> WorldSnapshot {
        WorldSnapshot {
            players: players.iter().map(|n| Player::named(*n)).collect(),
            pal_count: pals,
            base_count: 0,
            world_id: Some("ABC123".to_string()),
            host_player: players.first().map(|n| (*n).to_string()),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_state_starts_empty() {
        let state = WorldState::new();
        assert!(state.players.is_empty());
        assert_eq!(state.pal_count, 0);
        assert!(!state.has_parsed());
    }

    #[test]
    fn test_apply_overwrites_fields() {
        let mut state = WorldState::new();
        state.apply(&snapshot(&["Alice", "Bob"], 12));

        assert_eq!(state.players.len(), 2);
        assert_eq!(state.pal_count, 12);
        assert_eq!(state.world_id.as_deref(), Some("ABC123"));
        assert!(state.has_parsed());

        state.apply(&snapshot(&["Alice"], 3));
        assert_eq!(state.players.len(), 1);
        assert_eq!(state.pal_count, 3);
    }

    #[test]
    fn test_apply_deduplicates_players() {
        let mut snap = snapshot(&["Alice"], 1);
        snap.players.push(Player {
            name: "Alice".to_string(),
            level: Some(30),
            is_host: false,
        });

        let mut state = WorldState::new();
        state.apply(&snap);
        assert_eq!(state.players.len(), 1);
        // First occurrence wins.
        assert_eq!(state.players[0].level, None);
    }

    #[test]
    fn test_player_lookup() {
        let mut state = WorldState::new();
        state.apply(&snapshot(&["Alice", "Bob"], 5));
        assert!(state.player("Bob").is_some());
        assert!(state.player("Carol").is_none());
    }
}
