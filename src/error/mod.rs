//! Error types and Result aliases for palwatch.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

/// Result type alias using palwatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for palwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Save parsing error.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Upstream relay error.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// Server/API error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors from the external save parser.
///
/// None of these are fatal: the pipeline falls back to path-based
/// classification when a snapshot cannot be produced.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Parser command could not be launched.
    #[error("failed to launch parser '{command}': {reason}")]
    Launch { command: String, reason: String },

    /// Parser exceeded its timeout.
    #[error("parser timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Parser exited with a failure status.
    #[error("parser failed ({status}): {stderr}")]
    ToolFailed { status: String, stderr: String },

    /// Parser output could not be decoded.
    #[error("malformed parser output: {0}")]
    Malformed(String),
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The underlying notification stream reported an error.
    #[error("watch stream error: {0}")]
    Stream(String),
}

/// Upstream relay errors.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Failed to establish the upstream connection.
    #[error("failed to connect to '{url}': {reason}")]
    Connect { url: String, reason: String },

    /// A relayed payload failed to decode.
    #[error("malformed upstream message: {0}")]
    Decode(String),
}

/// Server/API errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {address}: {reason}")]
    BindFailed { address: String, reason: String },

    /// Request handling error.
    #[error("request error: {0}")]
    Request(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
