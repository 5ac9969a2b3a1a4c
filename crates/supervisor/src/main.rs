//! Supervisor entry point

use anyhow::{Context, Result};
use child_process::{LocalLauncher, RelaySinks};
use clap::Parser;
use std::sync::Arc;
use supervisor::{Cli, RotatingFileSink, SignalRouter, Supervisor, logging};
use tracing::{error, info};

fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;

    let log = RotatingFileSink::open(&config.log_file, config.rotation)
        .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;

    // Held until main returns so queued log lines are flushed on exit.
    let _guard = logging::init(log.clone(), config.verbose)?;

    info!(
        log_file = %config.log_file.display(),
        max_bytes = config.rotation.max_bytes,
        backups = config.rotation.max_backups,
        "Logging to rotating file"
    );

    let (controls_tx, controls_rx) = async_channel::unbounded();
    let router = SignalRouter::install(controls_tx).context("Failed to install signal handlers")?;

    let launcher = LocalLauncher::new(RelaySinks::console(Arc::new(log)));
    let supervisor = Supervisor::new(config.command, launcher, config.poll_interval);

    let result = smol::block_on(supervisor.run(controls_rx));
    router.close();

    match result {
        Ok(_) => {
            info!("Supervisor exiting");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Supervisor failed");
            Err(e.into())
        }
    }
}
