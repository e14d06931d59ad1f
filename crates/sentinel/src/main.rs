// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sentinel::clock::SystemClock;
use sentinel::config::Config;
use sentinel::monitor::Monitor;
use sentinel::notify::LogNotifier;
use sentinel::registry::{FileRegistry, SessionStatus};
use sentinel::tmux::TmuxPaneAdapter;

#[derive(Parser)]
#[command(name = "sentinel", version, about = "Pane supervisor daemon for AI coding sessions.")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    subcommand: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Register a session record for a tmux pane.
    Add {
        /// Human label for the session.
        name: String,
        /// tmux target for the pane (e.g. `work:0.0` or `%3`).
        pane: String,
    },
    /// Print the registry contents.
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = cli.config;

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    match cli.subcommand {
        Some(Commands::Add { name, pane }) => {
            std::process::exit(run_add(&config, &name, &pane));
        }
        Some(Commands::List) => {
            std::process::exit(run_list(&config));
        }
        None => {
            init_tracing(&config);
            if let Err(e) = run_daemon(config).await {
                error!("fatal: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    if config.log_format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn run_add(config: &Config, name: &str, pane: &str) -> i32 {
    match FileRegistry::open(config.registry_path()).and_then(|r| r.create(name, pane)) {
        Ok(record) => {
            println!("{} {} {}", record.id, record.name, record.pane_id);
            0
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    }
}

fn run_list(config: &Config) -> i32 {
    match FileRegistry::open(config.registry_path()) {
        Ok(registry) => {
            for record in registry.list() {
                println!(
                    "{} {} {} {}",
                    record.id, record.name, record.pane_id, record.status
                );
            }
            0
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    }
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    let registry = Arc::new(FileRegistry::open(config.registry_path())?);
    let monitor = Monitor::new(
        config.monitor_config()?,
        Arc::new(TmuxPaneAdapter::new(config.tmux_bin.clone())),
        Arc::clone(&registry) as Arc<dyn sentinel::registry::SessionRegistry>,
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
    )?;

    let mut started = 0usize;
    for record in registry.list() {
        if record.status != SessionStatus::Ended {
            monitor.start_monitoring(&record.id);
            started += 1;
        }
    }
    info!(sessions = started, "sentinel monitoring");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    monitor.shutdown().await;
    Ok(())
}
