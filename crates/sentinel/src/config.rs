// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Pane supervisor daemon for AI coding sessions.
#[derive(Debug, Parser)]
#[command(name = "sentinel", version, about)]
pub struct Config {
    /// Poll interval in milliseconds (minimum 250).
    #[arg(long, env = "SENTINEL_POLL_INTERVAL", default_value = "2000")]
    pub poll_interval: u64,

    /// Consecutive polling failures tolerated before a session is dropped.
    #[arg(long, env = "SENTINEL_MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// Restart hint for the process supervisor. Carried, not consulted here.
    #[arg(long, env = "SENTINEL_AUTO_RESTART", default_value = "true")]
    pub auto_restart: bool,

    /// Path to the session registry file.
    /// Defaults to `$XDG_STATE_HOME/sentinel/sessions.json`.
    #[arg(long, env = "SENTINEL_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Terminal multiplexer binary to drive.
    #[arg(long, env = "SENTINEL_TMUX_BIN", default_value = "tmux")]
    pub tmux_bin: String,

    /// Log format (json or text).
    #[arg(long, env = "SENTINEL_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "SENTINEL_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.monitor_config()?;
        if self.log_format != "json" && self.log_format != "text" {
            anyhow::bail!("invalid log format: {}", self.log_format);
        }
        Ok(())
    }

    /// Build the engine configuration.
    pub fn monitor_config(&self) -> anyhow::Result<MonitorConfig> {
        let config = MonitorConfig {
            poll_interval: Duration::from_millis(self.poll_interval),
            max_retries: self.max_retries,
            auto_restart: self.auto_restart,
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the registry path, defaulting under the state directory.
    pub fn registry_path(&self) -> PathBuf {
        match &self.registry {
            Some(path) => path.clone(),
            None => {
                let state_home = std::env::var("XDG_STATE_HOME").unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_default();
                    format!("{home}/.local/state")
                });
                PathBuf::from(state_home).join("sentinel").join("sessions.json")
            }
        }
    }
}

/// Configuration surface of the monitoring engine itself.
///
/// Supplied at construction; the engine reads no environment variables.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub max_retries: u32,
    /// Reserved for the process supervisor; the engine does not consult it.
    pub auto_restart: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_millis(2000), max_retries: 3, auto_restart: true }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval < Duration::from_millis(250) {
            anyhow::bail!("poll interval must be at least 250ms");
        }
        if self.max_retries < 1 {
            anyhow::bail!("max retries must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
