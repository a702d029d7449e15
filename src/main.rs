use anyhow::{Context, Result};
use clap::Parser;
use par_notes::cli::{self, Cli};
use par_notes_config::Config;
use std::time::Duration;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    // CLI --log-level takes precedence, then RUST_LOG, then the config file.
    par_notes::debug::init_log_bridge(cli.log_level, config.log_level.to_level_filter());
    log::info!("Starting par-notes v{}", par_notes::VERSION);

    // Runtime for the debounced sync timer and blocking HTTP sends
    let runtime = Runtime::new()?;
    let result = cli::run(cli.command, config, cli.config.as_deref(), &runtime);

    // Use `shutdown_timeout` so a hung request cannot keep the process alive.
    log::info!("Command finished, shutting down runtime");
    runtime.shutdown_timeout(Duration::from_secs(2));

    if let Err(ref e) = result {
        eprintln!("par-notes: error: {e:#}");
        std::process::exit(1);
    }
    result
}
