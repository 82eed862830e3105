//! File system watcher using notify-rs.

use std::path::{Path, PathBuf};

use notify::{EventKind as FsEventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::WatcherError;
use crate::Result;

/// Signal delivered by the watch thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSignal {
    /// A file under the watched tree was created or modified.
    Changed(PathBuf),
    /// The notification source reported an error. Watching stops, the
    /// process does not.
    Error(String),
}

/// Recursive directory-tree watcher for a save root.
///
/// Raw notify events are bridged onto a tokio channel from notify's
/// callback thread; coalescing happens downstream in
/// [`super::ChangeCoalescer`].
pub struct SaveWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<WatchSignal>,
}

impl SaveWatcher {
    /// Start watching `root` recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or the root
    /// does not exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(WatcherError::WatchFailed {
                path: root.display().to_string(),
                reason: "directory does not exist".to_string(),
            }
            .into());
        }

        let (tx, rx) = mpsc::channel(256);

        let mut watcher = notify::recommended_watcher(
            move |result: notify::Result<notify::Event>| match result {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        FsEventKind::Create(_) | FsEventKind::Modify(_)
                    ) {
                        for path in event.paths {
                            let _ = tx.blocking_send(WatchSignal::Changed(path));
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(WatchSignal::Error(e.to_string()));
                }
            },
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| WatcherError::WatchFailed {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %root.display(), "Watching save directory");

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Receive the next raw watch signal.
    ///
    /// Returns `None` if the watch thread has gone away.
    pub async fn recv(&mut self) -> Option<WatchSignal> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_nonexistent_root() {
        let result = SaveWatcher::new("/nonexistent/save/directory");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_watch_existing_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let watcher = SaveWatcher::new(tmp.path());
        assert!(watcher.is_ok());
    }
}
