//! The observer pipeline: coalesced batch -> snapshot/diff -> gate ->
//! broadcast.

use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use super::{run_coalescer, SaveWatcher};
use crate::events::{
    diff, flavor, select_best, EventGate, SaveKind, SemanticEvent, PRIORITY_FALLBACK,
};
use crate::hub::BroadcastHub;
use crate::server::metrics;
use crate::snapshot::{CommandProvider, SharedWorld, SnapshotProvider};
use crate::Config;

/// Capacity of the batch channel between the coalescer and the observer.
const BATCH_CHANNEL_CAPACITY: usize = 16;

/// Start the watch pipeline for observer mode.
///
/// A watch failure here is logged and no tasks are spawned; the process
/// keeps serving queries against last-known (empty) state rather than
/// exiting. Runtime stream errors are handled the same way inside the
/// coalescer task.
pub fn spawn_pipeline(config: &Config, hub: BroadcastHub, world: SharedWorld) {
    let watcher = match SaveWatcher::new(&config.watch_root) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::error!(
                error = %e,
                root = %config.watch_root.display(),
                "Cannot watch save directory; serving last-known state only"
            );
            return;
        }
    };

    let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);

    let debounce = config.debounce;
    tokio::spawn(async move {
        if let Err(e) = run_coalescer(watcher, batch_tx, debounce).await {
            tracing::error!(error = %e, "Watching stopped; still serving last-known state");
        }
    });

    let provider = CommandProvider::new(&config.parser_command, config.parser_timeout);
    let observer = Observer::new(provider, world, hub, config.cooldown);
    tokio::spawn(observer.run(batch_rx));
}

/// Runs one diff/classification pass per coalesced batch and owns the
/// retained world state's write side.
///
/// Batches are handled strictly in flush order; a batch's diff and gate
/// decision complete before the next batch is taken off the channel.
pub struct Observer<P> {
    provider: P,
    world: SharedWorld,
    hub: BroadcastHub,
    gate: EventGate,
    rng: SmallRng,
}

impl<P: SnapshotProvider> Observer<P> {
    /// Create an observer.
    #[must_use]
    pub fn new(provider: P, world: SharedWorld, hub: BroadcastHub, cooldown: Duration) -> Self {
        Self {
            provider,
            world,
            hub,
            gate: EventGate::new(cooldown),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Consume flushed batches until the channel closes.
    pub async fn run(mut self, mut batches: mpsc::Receiver<Vec<PathBuf>>) {
        while let Some(batch) = batches.recv().await {
            self.handle_batch(batch).await;
        }
        tracing::info!("Observer pipeline stopped");
    }

    /// Analyze one coalesced batch.
    pub async fn handle_batch(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        metrics::BATCHES_TOTAL.inc();
        self.hub.publish_file_changed(&paths);

        let candidates = self.classify(&paths).await;
        let had_candidates = !candidates.is_empty();

        match self.gate.admit(candidates) {
            Some(event) => {
                metrics::EVENTS_EMITTED
                    .with_label_values(&[&kind_label(&event)])
                    .inc();
                tracing::info!(kind = ?event.kind, message = %event.message, "Event emitted");
                let world = self.world.read().await.clone();
                self.hub.publish_event(&event, Some(world)).await;
            }
            None if had_candidates => {
                metrics::EVENTS_SUPPRESSED.inc();
            }
            None => {}
        }
    }

    /// Produce ranked candidates: diff against a fresh snapshot when
    /// the parser succeeds, coarse path classification when it fails.
    /// State is updated regardless of what the gate later decides.
    async fn classify(&mut self, paths: &[PathBuf]) -> Vec<SemanticEvent> {
        let primary = select_best(paths)
            .map_or_else(|| paths[0].clone(), |(_, path)| path.to_path_buf());

        match self.provider.snapshot(&primary).await {
            Ok(snapshot) => {
                let mut world = self.world.write().await;
                let events = diff(&snapshot, &world, &mut self.rng);
                world.apply(&snapshot);
                tracing::debug!(
                    players = snapshot.players.len(),
                    pals = snapshot.pal_count,
                    events = events.len(),
                    "Snapshot diffed"
                );
                events
            }
            Err(e) => {
                metrics::PARSE_FAILURES.inc();
                tracing::warn!(
                    path = %primary.display(),
                    error = %e,
                    "Save parse failed, falling back to path classification"
                );
                self.fallback_candidates(paths)
            }
        }
    }

    /// Degraded path: one coarse event from the best-classified path.
    fn fallback_candidates(&mut self, paths: &[PathBuf]) -> Vec<SemanticEvent> {
        let Some((save_kind, _)) = select_best(paths) else {
            return Vec::new();
        };
        let Some(kind) = save_kind.event_kind() else {
            return Vec::new();
        };
        let message = match save_kind {
            SaveKind::World => flavor::world_save(&mut self.rng),
            SaveKind::Player => flavor::player_save(&mut self.rng),
            SaveKind::Local => flavor::local_save(&mut self.rng),
            SaveKind::Meta | SaveKind::Unknown => flavor::meta_save(&mut self.rng),
        };
        vec![SemanticEvent::new(kind, message, PRIORITY_FALLBACK)]
    }
}

fn kind_label(event: &SemanticEvent) -> String {
    // serde gives us the canonical snake_case name.
    serde_json::to_string(&event.kind)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}
