// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jj::config::{DEFAULT_BIND_ADDRESS, DEFAULT_PORT};
use jj::{Server, ServiceConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// jj - session-scoped key/value staging service.
#[derive(Parser)]
#[command(name = "jj")]
#[command(version = VERSION)]
#[command(about = "Session-scoped key/value staging service.")]
#[command(long_about = "jj - session-scoped key/value staging service\n\n\
    Start the server:    FLAG=... jj\n\
    Custom port:         jj --port 9000\n\
    Local only:          jj --bind 127.0.0.1\n\n\
    Submitted pairs are sanitized and merged by a background sweep.")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = DEFAULT_BIND_ADDRESS)]
    bind: String,

    /// Sweep period in milliseconds
    #[arg(long, default_value_t = 100)]
    sweep_interval_ms: u64,

    /// Maximum sanitize threads per sweep (defaults to available parallelism)
    #[arg(long)]
    sanitize_workers: Option<usize>,

    /// Verbose mode: debug-level logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ServiceConfig::from_env()
        .with_port(cli.port)
        .with_bind_address(cli.bind)
        .with_sweep_interval(Duration::from_millis(cli.sweep_interval_ms));
    if let Some(workers) = cli.sanitize_workers {
        config = config.with_sanitize_workers(workers);
    }
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        "jj v{} | sweep_interval_ms={} sanitize_workers={}",
        VERSION,
        config.sweep_interval.as_millis(),
        config.sanitize_workers
    );

    Server::new(config).start().await
}
