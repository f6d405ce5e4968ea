//! MemFiler - In-memory file manager with quota and recycle bin
//!
//! Main entry point. Runs the interactive shell, or the framed
//! request/response engine with `--serve`.

mod app;
mod serve;

use anyhow::{Context, Result};
use app_core::{AppConfig, AppState};
use clap::Parser;
use std::path::PathBuf;

/// MemFiler - in-memory file manager
#[derive(Parser, Debug)]
#[command(name = "memfiler", version)]
#[command(about = "In-memory file manager with a storage quota and a recycle bin")]
struct Cli {
    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Storage limit in bytes
    #[arg(long)]
    limit: Option<u64>,

    /// Start with an empty filesystem instead of the demo content
    #[arg(long, default_value = "false")]
    empty: bool,

    /// Serve length-prefixed requests on stdin/stdout instead of the shell
    #[arg(long, default_value = "false")]
    serve: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(&self, config: &mut AppConfig) {
        if let Some(limit) = self.limit {
            config.storage.limit_bytes = limit;
        }
        if self.empty {
            config.seed.demo_content = false;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_default(),
    };
    cli.apply(&mut config);

    // Initialize logging and panic hook first
    let _log_guard = app_log::init(&app_log::LogOptions {
        level: config.logging.level.clone(),
        file: config.logging.file,
        dir: None,
    })?;

    if config.logging.file {
        if let Err(e) = app_log::cleanup_old_logs(config.logging.retention_days) {
            tracing::warn!("Failed to cleanup old logs: {}", e);
        }
    }

    tracing::info!("MemFiler starting...");

    let state = AppState::new(config)?;

    if cli.serve {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        serve::serve(&state, &mut stdin.lock(), &mut stdout.lock())
    } else {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        app::run(&state, stdin.lock(), stdout.lock())
    }
}
