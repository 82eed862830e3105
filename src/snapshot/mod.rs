//! World snapshots and the external save parser boundary.
//!
//! This module provides:
//! - Snapshot and retained-state data types
//! - The `SnapshotProvider` trait (opaque save parser)
//! - A provider implementation backed by an external parser command

mod model;
mod provider;

pub use model::{shared_world, Player, SharedWorld, WorldSnapshot, WorldState};
pub use provider::{CommandProvider, SnapshotProvider};
