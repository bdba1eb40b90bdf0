use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use valuestore::config::LogConfig;
use valuestore::{Config, Registry, Shell};

/// Named value registry driven by line commands on stdin
#[derive(Debug, Parser)]
#[command(name = "valuestore", version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(log: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match &log.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file '{}'", path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // stdout carries the replies
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }

    init_logging(&config.log)?;

    info!("Starting valuestore");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let registry = Arc::new(Registry::with_config(&config.registry));
    info!("Type mismatch policy: {:?}", registry.mismatch_policy());
    let shell = Shell::new(registry);
    shell.run(io::stdin().lock(), io::stdout().lock())?;

    Ok(())
}
