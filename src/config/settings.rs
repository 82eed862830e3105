//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default debounce window between a burst of save writes and analysis.
const DEFAULT_DEBOUNCE_MS: u64 = 5_000;

/// Default minimum interval between two automatically emitted events.
const DEFAULT_COOLDOWN_MS: u64 = 60_000;

/// Default timeout for the external save parser.
const DEFAULT_PARSER_TIMEOUT_SECS: u64 = 300;

/// Default delay between relay reconnect attempts.
const DEFAULT_RECONNECT_SECS: u64 = 5;

/// Main configuration for the palwatch process.
///
/// All values are fixed at process start; there is no hot reload.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the save directory tree to watch.
    pub watch_root: PathBuf,

    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Quiet-period window for coalescing filesystem notifications.
    pub debounce: Duration,

    /// Minimum interval between two automatically emitted events.
    pub cooldown: Duration,

    /// Upstream observer WebSocket URL. When set, the process runs as a
    /// relay mirroring that observer instead of watching files itself.
    pub upstream: Option<String>,

    /// Delay between relay reconnect attempts.
    pub reconnect_delay: Duration,

    /// External parser command invoked to summarize a save file.
    pub parser_command: String,

    /// Timeout applied to each parser invocation.
    pub parser_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_root: PathBuf::from("./saves"),
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            upstream: None,
            reconnect_delay: Duration::from_secs(DEFAULT_RECONNECT_SECS),
            parser_command: "palworld-save-tools".to_string(),
            parser_timeout: Duration::from_secs(DEFAULT_PARSER_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("port cannot be 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.host.is_empty() {
            return Err(Error::config("host cannot be empty"));
        }

        if self.debounce.is_zero() {
            return Err(Error::config("debounce window cannot be 0"));
        }

        if self.cooldown.is_zero() {
            return Err(Error::config("cooldown window cannot be 0"));
        }

        if self.parser_command.is_empty() {
            return Err(Error::config("parser command cannot be empty"));
        }

        if let Some(url) = &self.upstream {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err(Error::config(format!(
                    "upstream URL '{url}' must start with ws:// or wss://"
                )));
            }
        }

        Ok(())
    }

    /// Get the server address as a string.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.debounce, Duration::from_secs(5));
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert!(config.upstream.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let config = Config {
            port: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "invalid".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_validate_empty_host() {
        let config = Config {
            host: String::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_validate_zero_debounce() {
        let config = Config {
            debounce: Duration::ZERO,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("debounce"));
    }

    #[test]
    fn test_validate_zero_cooldown() {
        let config = Config {
            cooldown: Duration::ZERO,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cooldown"));
    }

    #[test]
    fn test_validate_upstream_scheme() {
        let config = Config {
            upstream: Some("http://example.com/ws".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ws://"));

        let config = Config {
            upstream: Some("ws://127.0.0.1:8080/ws".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_addr() {
        let config = Config {
            host: "0.0.0.0".to_string(),
            port: 9090,
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn test_all_log_levels_valid() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let config = Config {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "Level '{level}' should be valid");
        }
    }
}
