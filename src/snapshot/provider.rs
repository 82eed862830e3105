//! The opaque save parser boundary.
//!
//! Deep save parsing is not done in-process. A [`SnapshotProvider`]
//! turns a save path into a [`WorldSnapshot`] or fails; the production
//! implementation shells out to an external parser command that prints
//! a JSON summary of the save on stdout.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio::process::Command;

use super::{Player, WorldSnapshot};
use crate::error::SnapshotError;

/// Produces world snapshots from save files.
pub trait SnapshotProvider: Send + Sync {
    /// Parse the save at `path` into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] when the parse fails; the caller
    /// falls back to path-based classification.
    fn snapshot(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<WorldSnapshot, SnapshotError>> + Send;
}

/// JSON summary printed by the external parser command.
#[derive(Debug, Deserialize)]
struct ParserSummary {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    players: Vec<String>,
    #[serde(default)]
    pal_count: u32,
    #[serde(default)]
    work_entries: u32,
    #[serde(default)]
    world_id: Option<String>,
    #[serde(default)]
    host_player: Option<String>,
}

/// Snapshot provider backed by an external parser command.
///
/// Runs `<command> <save_path>` with a timeout and decodes the JSON
/// summary from stdout.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    command: String,
    timeout: Duration,
}

impl CommandProvider {
    /// Create a provider for the given parser command.
    #[must_use]
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }
}

impl SnapshotProvider for CommandProvider {
    async fn snapshot(&self, path: &Path) -> Result<WorldSnapshot, SnapshotError> {
        let child = Command::new(&self.command)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SnapshotError::Launch {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| SnapshotError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| SnapshotError::Launch {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(SnapshotError::ToolFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let summary: ParserSummary = serde_json::from_slice(&output.stdout)
            .map_err(|e| SnapshotError::Malformed(e.to_string()))?;

        if let Some(err) = summary.error {
            return Err(SnapshotError::ToolFailed {
                status: "reported".to_string(),
                stderr: err,
            });
        }

        Ok(build_snapshot(summary, path))
    }
}

/// Assemble a snapshot from the parser summary plus path-derived fields.
fn build_snapshot(summary: ParserSummary, path: &Path) -> WorldSnapshot {
    let host = summary.host_player;
    let players = summary
        .players
        .into_iter()
        .map(|name| {
            let is_host = host.as_deref() == Some(name.as_str());
            Player {
                name,
                level: None,
                is_host,
            }
        })
        .collect();

    WorldSnapshot {
        players,
        pal_count: summary.pal_count,
        base_count: summary.work_entries,
        world_id: summary.world_id.or_else(|| extract_world_id(path)),
        host_player: host,
        timestamp: Utc::now(),
    }
}

/// Extract the world identifier from a save path.
///
/// Save paths follow `SaveGames/<SteamID>/<WorldID>/Level.sav`; the
/// world ID is the parent directory of `Level.sav`.
#[must_use]
pub fn extract_world_id(path: &Path) -> Option<String> {
    if path.file_name()?.to_str()? != "Level.sav" {
        return None;
    }
    path.parent()?
        .file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extract_world_id() {
        let path = PathBuf::from("/saves/SaveGames/7656119/9A3B2C1D/Level.sav");
        assert_eq!(extract_world_id(&path).as_deref(), Some("9A3B2C1D"));
    }

    #[test]
    fn test_extract_world_id_non_level_file() {
        let path = PathBuf::from("/saves/SaveGames/7656119/9A3B2C1D/LevelMeta.sav");
        assert_eq!(extract_world_id(&path), None);
    }

    #[test]
    fn test_build_snapshot_marks_host() {
        let summary = ParserSummary {
            error: None,
            players: vec!["Alice".to_string(), "Bob".to_string()],
            pal_count: 42,
            work_entries: 2,
            world_id: None,
            host_player: Some("Alice".to_string()),
        };
        let path = PathBuf::from("/saves/SaveGames/7656119/WORLD1/Level.sav");

        let snap = build_snapshot(summary, &path);
        assert_eq!(snap.players.len(), 2);
        assert!(snap.players[0].is_host);
        assert!(!snap.players[1].is_host);
        assert_eq!(snap.pal_count, 42);
        assert_eq!(snap.base_count, 2);
        // World ID falls back to the path when the summary omits it.
        assert_eq!(snap.world_id.as_deref(), Some("WORLD1"));
    }

    #[tokio::test]
    async fn test_missing_parser_command() {
        let provider = CommandProvider::new(
            "palwatch-test-no-such-parser-binary",
            Duration::from_secs(5),
        );
        let err = provider
            .snapshot(Path::new("/tmp/Level.sav"))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_parser_reported_error() {
        // `echo` exits 0 but prints a summary carrying an error field.
        let provider = CommandProvider::new("echo", Duration::from_secs(5));
        let err = provider
            .snapshot(Path::new("{\"error\": \"decompression failed\"}"))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::ToolFailed { .. }));
    }
}
