//! Snapshot diffing into ranked semantic events.

use rand::Rng;
use serde_json::json;

use super::{
    flavor, EventKind, SemanticEvent, PRIORITY_FALLBACK, PRIORITY_IDENTITY, PRIORITY_QUANTITY,
};
use crate::snapshot::{WorldSnapshot, WorldState};

/// Compare a new snapshot against the retained state and produce ranked
/// events, most newsworthy first.
///
/// Rule precedence: identity changes (who is present) outrank quantity
/// changes, which outrank the generic `world_save` fallback. The
/// fallback fires only when nothing else did and a prior parse exists,
/// so the very first observation stays silent.
///
/// The caller is responsible for applying the snapshot to the retained
/// state afterwards (see [`WorldState::apply`]).
pub fn diff(
    new: &WorldSnapshot,
    prev: &WorldState,
    rng: &mut impl Rng,
) -> Vec<SemanticEvent> {
    let mut events = Vec::new();

    // Identity: arrivals, then departures.
    for player in &new.players {
        if prev.player(&player.name).is_none() {
            events.push(
                SemanticEvent::new(
                    EventKind::NewPlayer,
                    flavor::new_player(rng, &player.name),
                    PRIORITY_IDENTITY,
                )
                .with_data(json!({"name": player.name, "level": player.level})),
            );
        }
    }
    for player in &prev.players {
        if !new.players.iter().any(|p| p.name == player.name) {
            events.push(
                SemanticEvent::new(
                    EventKind::PlayerLeft,
                    flavor::player_left(rng, &player.name),
                    PRIORITY_IDENTITY,
                )
                .with_data(json!({"name": player.name})),
            );
        }
    }

    // Quantity: pal count delta. A gain is suppressed when the previous
    // count was 0, which covers the first parse where the count was
    // simply unknown.
    let delta = i64::from(new.pal_count) - i64::from(prev.pal_count);
    if delta > 0 && prev.pal_count > 0 {
        events.push(
            SemanticEvent::new(
                EventKind::EntityGained,
                flavor::entity_gained(rng, new.pal_count, delta),
                PRIORITY_QUANTITY,
            )
            .with_data(json!({"new_count": new.pal_count, "delta": delta})),
        );
    } else if delta < 0 {
        events.push(
            SemanticEvent::new(
                EventKind::EntityLost,
                flavor::entity_lost(rng, new.pal_count, delta),
                PRIORITY_QUANTITY,
            )
            .with_data(json!({"new_count": new.pal_count, "delta": delta})),
        );
    }

    // Player level ups, for saves that report levels.
    for player in &new.players {
        let (Some(new_level), Some(retained)) = (player.level, prev.player(&player.name)) else {
            continue;
        };
        if let Some(old_level) = retained.level {
            if new_level > old_level {
                events.push(
                    SemanticEvent::new(
                        EventKind::PlayerLeveled,
                        flavor::player_leveled(rng, &player.name, old_level, new_level),
                        PRIORITY_QUANTITY,
                    )
                    .with_data(json!({"name": player.name, "old": old_level, "new": new_level})),
                );
            }
        }
    }

    // New base camps. Suppressed until a prior parse exists, like the
    // pal-count gain rule.
    if prev.has_parsed() && new.base_count > prev.base_count {
        events.push(
            SemanticEvent::new(
                EventKind::BaseCreated,
                flavor::base_created(rng, new.base_count),
                PRIORITY_QUANTITY,
            )
            .with_data(json!({"count": new.base_count})),
        );
    }

    // Undifferentiated "something saved" fallback; exists only to avoid
    // total silence after the first observation.
    if events.is_empty() && prev.has_parsed() {
        events.push(SemanticEvent::new(
            EventKind::WorldSave,
            flavor::world_save(rng),
            PRIORITY_FALLBACK,
        ));
    }

    events.sort_by_key(|e| e.priority);
    events
}
