//! Quiet-period coalescing of filesystem notifications.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::watch::{SaveWatcher, WatchSignal};
use crate::error::WatcherError;
use crate::Result;

/// Coalesces a burst of change notifications into one pending set per
/// quiet period.
///
/// The timer is armed exactly once per quiet period and is NOT re-armed
/// by further notifications, so a save that keeps changing every few
/// seconds still flushes at a bounded cadence instead of being starved.
///
/// This is the pure state machine ({Idle, Armed(deadline)} plus the
/// deduplicated pending set); [`run_coalescer`] wires it to real timers.
#[derive(Debug)]
pub struct ChangeCoalescer {
    window: Duration,
    pending: Vec<PathBuf>,
    armed_at: Option<Instant>,
}

impl ChangeCoalescer {
    /// Create a coalescer with the given quiet-period window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Vec::new(),
            armed_at: None,
        }
    }

    /// Record a change notification.
    ///
    /// Duplicate paths are ignored; insertion order is preserved.
    /// Returns the flush deadline when this notification armed the
    /// timer, `None` when a flush was already scheduled.
    pub fn note(&mut self, path: PathBuf) -> Option<Instant> {
        if !self.pending.contains(&path) {
            self.pending.push(path);
        }

        if self.armed_at.is_some() {
            return None;
        }
        let now = Instant::now();
        self.armed_at = Some(now);
        Some(now + self.window)
    }

    /// Hand over the pending set and return to Idle.
    ///
    /// A flush with an empty set is a no-op for the caller; the state
    /// machine still disarms.
    pub fn flush(&mut self) -> Vec<PathBuf> {
        self.armed_at = None;
        std::mem::take(&mut self.pending)
    }

    /// The scheduled flush deadline, if the timer is armed.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.armed_at.map(|armed| armed + self.window)
    }

    /// Whether any notifications are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Drive a [`ChangeCoalescer`] from a live watcher, sending each flushed
/// batch downstream.
///
/// Returns when the watch channel closes; returns an error when the
/// notification source reports one. Either way the process keeps
/// serving queries against last-known state.
///
/// # Errors
///
/// Returns [`WatcherError::Stream`] when the underlying watch fails.
pub async fn run_coalescer(
    mut watcher: SaveWatcher,
    batches: mpsc::Sender<Vec<PathBuf>>,
    window: Duration,
) -> Result<()> {
    let mut coalescer = ChangeCoalescer::new(window);

    loop {
        let deadline = coalescer.deadline();
        tokio::select! {
            signal = watcher.recv() => match signal {
                Some(WatchSignal::Changed(path)) => {
                    tracing::trace!(path = %path.display(), "Save file changed");
                    coalescer.note(path);
                }
                Some(WatchSignal::Error(reason)) => {
                    return Err(WatcherError::Stream(reason).into());
                }
                None => break,
            },
            () = sleep_until_opt(deadline), if deadline.is_some() => {
                let batch = coalescer.flush();
                if batch.is_empty() {
                    continue;
                }
                tracing::debug!(paths = batch.len(), "Flushing coalesced batch");
                if batches.send(batch).await.is_err() {
                    // Pipeline gone; nothing left to do.
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_deduplicated_set() {
        let mut c = ChangeCoalescer::new(Duration::from_secs(5));

        assert!(c.note(p("/saves/Level.sav")).is_some());
        assert!(c.note(p("/saves/Players/UID1.sav")).is_none());
        assert!(c.note(p("/saves/Level.sav")).is_none());
        assert!(c.note(p("/saves/Level.sav")).is_none());

        let batch = c.flush();
        assert_eq!(
            batch,
            vec![p("/saves/Level.sav"), p("/saves/Players/UID1.sav")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_not_rearmed_during_quiet_period() {
        let mut c = ChangeCoalescer::new(Duration::from_secs(5));

        let deadline = c.note(p("/saves/Level.sav")).unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        // A later notification must not move the flush deadline.
        assert!(c.note(p("/saves/Level.sav")).is_none());
        assert_eq!(c.deadline(), Some(deadline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearms_after_flush() {
        let mut c = ChangeCoalescer::new(Duration::from_secs(5));

        c.note(p("/saves/Level.sav"));
        let first = c.flush();
        assert_eq!(first.len(), 1);
        assert!(c.deadline().is_none());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(c.note(p("/saves/Level.sav")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_flush_is_noop() {
        let mut c = ChangeCoalescer::new(Duration::from_secs(5));
        c.note(p("/saves/Level.sav"));
        assert_eq!(c.flush().len(), 1);
        assert!(c.flush().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_writes_flush_at_bounded_cadence() {
        // A file changing every second must still flush once the
        // original deadline passes, not be starved indefinitely.
        let mut c = ChangeCoalescer::new(Duration::from_secs(5));
        let deadline = c.note(p("/saves/Level.sav")).unwrap();

        for _ in 0..10 {
            tokio::time::advance(Duration::from_secs(1)).await;
            c.note(p("/saves/Level.sav"));
        }
        assert_eq!(c.deadline(), Some(deadline));
        assert!(Instant::now() >= deadline);
        assert_eq!(c.flush().len(), 1);
    }
}
