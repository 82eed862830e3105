//! palwatch - Palworld save observer
//!
//! Entry point for the observer process.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::time::Duration;

use clap::Parser;
use palwatch::hub::BroadcastHub;
use palwatch::relay::RelayClient;
use palwatch::server::{init_metrics, init_tracing, App, ServerConfig, ServerState};
use palwatch::snapshot::shared_world;
use palwatch::watcher::spawn_pipeline;
use palwatch::{Config, Result};

/// palwatch - Palworld save observer
#[derive(Parser, Debug)]
#[command(name = "palwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root of the save directory tree to watch
    #[arg(short, long, env = "PALWATCH_WATCH_ROOT", default_value = "./saves")]
    watch_root: std::path::PathBuf,

    /// Host address to bind to
    #[arg(long, env = "PALWATCH_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PALWATCH_PORT", default_value = "8080")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PALWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "PALWATCH_LOG_JSON")]
    log_json: bool,

    /// Quiet-period window for coalescing save writes, in milliseconds
    #[arg(long, env = "PALWATCH_DEBOUNCE_MS", default_value = "5000")]
    debounce_ms: u64,

    /// Minimum interval between automatic events, in milliseconds
    #[arg(long, env = "PALWATCH_COOLDOWN_MS", default_value = "60000")]
    cooldown_ms: u64,

    /// Upstream observer WebSocket URL; enables relay mode
    #[arg(short, long, env = "PALWATCH_UPSTREAM")]
    upstream: Option<String>,

    /// Delay between relay reconnect attempts, in seconds
    #[arg(long, env = "PALWATCH_RECONNECT_SECS", default_value = "5")]
    reconnect_secs: u64,

    /// External save parser command
    #[arg(
        long,
        env = "PALWATCH_PARSER_COMMAND",
        default_value = "palworld-save-tools"
    )]
    parser_command: String,

    /// Timeout for each parser invocation, in seconds
    #[arg(long, env = "PALWATCH_PARSER_TIMEOUT_SECS", default_value = "300")]
    parser_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    tracing::info!("palwatch v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config {
        watch_root: cli.watch_root,
        host: cli.host,
        port: cli.port,
        log_level: cli.log_level,
        debounce: Duration::from_millis(cli.debounce_ms),
        cooldown: Duration::from_millis(cli.cooldown_ms),
        upstream: cli.upstream,
        reconnect_delay: Duration::from_secs(cli.reconnect_secs),
        parser_command: cli.parser_command,
        parser_timeout: Duration::from_secs(cli.parser_timeout_secs),
    };

    tracing::debug!(?config, "Configuration loaded");
    config.validate()?;

    init_metrics();

    let hub = BroadcastHub::new();
    let world = shared_world();

    if let Some(upstream) = config.upstream.clone() {
        tracing::info!(%upstream, "Running in relay mode");
        let relay = RelayClient::new(
            upstream,
            config.reconnect_delay,
            hub.clone(),
            world.clone(),
        );
        tokio::spawn(relay.run());
    } else {
        tracing::info!(root = %config.watch_root.display(), "Running in observer mode");
        spawn_pipeline(&config, hub.clone(), world.clone());
    }

    let server_config = ServerConfig {
        host: config.host,
        port: config.port,
        ..Default::default()
    };

    let app = App::new(server_config, ServerState::new(hub, world));
    app.run().await
}
