// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

use super::*;

#[test]
fn defaults_parse_and_validate() -> anyhow::Result<()> {
    let config = Config::try_parse_from(["sentinel"])?;
    config.validate()?;
    let monitor = config.monitor_config()?;
    assert_eq!(monitor.poll_interval, Duration::from_millis(2000));
    assert_eq!(monitor.max_retries, 3);
    assert!(monitor.auto_restart);
    Ok(())
}

#[test]
fn poll_interval_below_floor_is_rejected() -> anyhow::Result<()> {
    let config = Config::try_parse_from(["sentinel", "--poll-interval", "100"])?;
    assert!(config.validate().is_err());
    Ok(())
}

#[test]
fn zero_retries_is_rejected() -> anyhow::Result<()> {
    let config = Config::try_parse_from(["sentinel", "--max-retries", "0"])?;
    assert!(config.validate().is_err());
    Ok(())
}

#[test]
fn unknown_log_format_is_rejected() -> anyhow::Result<()> {
    let config = Config::try_parse_from(["sentinel", "--log-format", "xml"])?;
    assert!(config.validate().is_err());
    Ok(())
}

#[test]
fn explicit_registry_path_wins() -> anyhow::Result<()> {
    let config = Config::try_parse_from(["sentinel", "--registry", "/tmp/reg.json"])?;
    assert_eq!(config.registry_path(), std::path::PathBuf::from("/tmp/reg.json"));
    Ok(())
}

#[test]
fn monitor_config_default_is_valid() {
    assert!(MonitorConfig::default().validate().is_ok());
}

#[test]
fn minimum_poll_interval_is_accepted() {
    let config = MonitorConfig { poll_interval: Duration::from_millis(250), ..Default::default() };
    assert!(config.validate().is_ok());
}
