//! File system watching and the save-analysis pipeline.
//!
//! This module provides:
//! - Directory watching using notify-rs
//! - Quiet-period coalescing of bursty save writes
//! - The observer pipeline: batch -> snapshot/diff -> gate -> broadcast

mod coalescer;
mod pipeline;
mod watch;

pub use coalescer::{run_coalescer, ChangeCoalescer};
pub use pipeline::{spawn_pipeline, Observer};
pub use watch::{SaveWatcher, WatchSignal};
