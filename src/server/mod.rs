//! HTTP and WebSocket surface.
//!
//! This module provides:
//! - The push-channel WebSocket endpoint backed by the hub
//! - REST endpoints for health, status, announcements and metrics
//! - Tracing/metrics initialization and the application server

mod app;
pub mod metrics;
mod observability;
mod rest;
mod ws;

pub use app::{App, ServerConfig, ServerState};
pub use metrics::init_metrics;
pub use observability::init_tracing;
