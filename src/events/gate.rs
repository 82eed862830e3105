//! Global emission cooldown gate.

use std::time::Duration;

use tokio::time::Instant;

use super::SemanticEvent;

/// Hard global rate limiter over automatic event emission.
///
/// One slot exists per cooldown window regardless of event kind, so a
/// high-priority event can consume the slot a lower-priority event
/// would otherwise have used. Manual announcements bypass the gate
/// entirely and never pass through here.
///
/// Uses `tokio::time::Instant`, so tests can drive it with a paused
/// runtime clock.
#[derive(Debug)]
pub struct EventGate {
    cooldown: Duration,
    last_emit: Option<Instant>,
}

impl EventGate {
    /// Create a gate with the given cooldown window.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_emit: None,
        }
    }

    /// Pick the single best candidate and decide whether to emit it.
    ///
    /// Returns `None` when there are no candidates or the cooldown
    /// window has not elapsed. On emission the window restarts.
    pub fn admit(&mut self, mut candidates: Vec<SemanticEvent>) -> Option<SemanticEvent> {
        if candidates.is_empty() {
            return None;
        }
        // Stable: rule order breaks priority ties.
        candidates.sort_by_key(|e| e.priority);
        let best = candidates.into_iter().next()?;

        let now = Instant::now();
        if let Some(last) = self.last_emit {
            if now.duration_since(last) <= self.cooldown {
                tracing::debug!(kind = ?best.kind, "Event suppressed by cooldown");
                return None;
            }
        }

        self.last_emit = Some(now);
        Some(best)
    }

    /// Time remaining until the gate reopens, if it is closed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let last = self.last_emit?;
        self.cooldown.checked_sub(Instant::now().duration_since(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, PRIORITY_FALLBACK, PRIORITY_IDENTITY, PRIORITY_QUANTITY};

    fn event(kind: EventKind, priority: u8) -> SemanticEvent {
        SemanticEvent::new(kind, format!("{kind:?}"), priority)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_event_passes() {
        let mut gate = EventGate::new(Duration::from_secs(60));
        let emitted = gate.admit(vec![event(EventKind::WorldSave, PRIORITY_FALLBACK)]);
        assert!(emitted.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_picks_highest_priority() {
        let mut gate = EventGate::new(Duration::from_secs(60));
        let emitted = gate
            .admit(vec![
                event(EventKind::EntityGained, PRIORITY_QUANTITY),
                event(EventKind::NewPlayer, PRIORITY_IDENTITY),
            ])
            .unwrap();
        assert_eq!(emitted.kind, EventKind::NewPlayer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_suppresses_second_flush() {
        let mut gate = EventGate::new(Duration::from_secs(60));

        assert!(gate
            .admit(vec![event(EventKind::WorldSave, PRIORITY_FALLBACK)])
            .is_some());

        // Second flush 5 s later: computed but suppressed.
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(gate
            .admit(vec![event(EventKind::NewPlayer, PRIORITY_IDENTITY)])
            .is_none());

        // After the window, emission resumes.
        tokio::time::advance(Duration::from_secs(56)).await;
        assert!(gate
            .admit(vec![event(EventKind::WorldSave, PRIORITY_FALLBACK)])
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppression_does_not_restart_window() {
        let mut gate = EventGate::new(Duration::from_secs(60));
        gate.admit(vec![event(EventKind::WorldSave, PRIORITY_FALLBACK)]);

        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(gate
            .admit(vec![event(EventKind::WorldSave, PRIORITY_FALLBACK)])
            .is_none());

        // 61 s since the accepted emission, 21 s since the suppressed
        // attempt: the gate must be open.
        tokio::time::advance(Duration::from_secs(21)).await;
        assert!(gate
            .admit(vec![event(EventKind::WorldSave, PRIORITY_FALLBACK)])
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_candidates() {
        let mut gate = EventGate::new(Duration::from_secs(60));
        assert!(gate.admit(Vec::new()).is_none());
        assert!(gate.remaining().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining() {
        let mut gate = EventGate::new(Duration::from_secs(60));
        gate.admit(vec![event(EventKind::WorldSave, PRIORITY_FALLBACK)]);

        tokio::time::advance(Duration::from_secs(20)).await;
        let remaining = gate.remaining().unwrap();
        assert_eq!(remaining, Duration::from_secs(40));
    }
}
