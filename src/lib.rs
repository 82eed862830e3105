//! palwatch - Palworld save observer
//!
//! Watches a save directory tree, coalesces bursts of writes, diffs
//! successive world snapshots into semantic events, and broadcasts them
//! to attached consumers over a WebSocket push channel. A relay mode
//! mirrors another observer for secondary consumers.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod hub;
pub mod relay;
pub mod server;
pub mod snapshot;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
