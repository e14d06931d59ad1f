// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane driver over the tmux CLI.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::pane::{PaneAdapter, PaneError};

/// Hard deadline for the pane-exists probe; a hung server reads as gone.
const EXISTS_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause between keystrokes of the continue sequence so the client can
/// render in between.
const KEY_GAP: Duration = Duration::from_millis(200);

/// [`PaneAdapter`] implementation shelling out to `tmux`.
///
/// Panes are addressed with tmux target syntax (`session:window.pane` or a
/// `%pane` id), passed through untouched.
#[derive(Debug, Clone)]
pub struct TmuxPaneAdapter {
    tmux_bin: String,
}

impl TmuxPaneAdapter {
    pub fn new(tmux_bin: impl Into<String>) -> Self {
        Self { tmux_bin: tmux_bin.into() }
    }

    async fn exec(&self, args: &[&str]) -> Result<String, PaneError> {
        let output = Command::new(&self.tmux_bin)
            .args(args)
            .output()
            .await
            .map_err(|e| PaneError::Command { detail: e.to_string() })?;
        if !output.status.success() {
            return Err(PaneError::Command {
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TmuxPaneAdapter {
    fn default() -> Self {
        Self::new("tmux")
    }
}

#[async_trait]
impl PaneAdapter for TmuxPaneAdapter {
    async fn capture_plain(&self, pane_id: &str) -> Result<String, PaneError> {
        self.exec(&["capture-pane", "-p", "-t", pane_id]).await
    }

    async fn capture_colored(&self, pane_id: &str) -> Result<String, PaneError> {
        self.exec(&["capture-pane", "-p", "-e", "-t", pane_id]).await
    }

    async fn pane_exists(&self, pane_id: &str) -> bool {
        let args = ["display-message", "-p", "-t", pane_id, "#{pane_id}"];
        let probe = self.exec(&args);
        match tokio::time::timeout(EXISTS_TIMEOUT, probe).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(pane = %pane_id, "pane probe failed: {e}");
                false
            }
            Err(_) => {
                debug!(pane = %pane_id, "pane probe timed out");
                false
            }
        }
    }

    async fn send_cooked(&self, pane_id: &str, text: &str) -> Result<(), PaneError> {
        self.exec(&["send-keys", "-t", pane_id, "-l", text]).await?;
        self.exec(&["send-keys", "-t", pane_id, "Enter"]).await?;
        Ok(())
    }

    async fn send_raw(&self, pane_id: &str, token: &str) -> Result<(), PaneError> {
        if is_key_token(token) {
            self.exec(&["send-keys", "-t", pane_id, token]).await?;
        } else {
            self.exec(&["send-keys", "-t", pane_id, "-l", token]).await?;
        }
        Ok(())
    }

    async fn send_continue_sequence(&self, pane_id: &str) -> Result<(), PaneError> {
        self.exec(&["send-keys", "-t", pane_id, "C-u"]).await?;
        tokio::time::sleep(KEY_GAP).await;
        self.exec(&["send-keys", "-t", pane_id, "-l", "continue"]).await?;
        tokio::time::sleep(KEY_GAP).await;
        self.exec(&["send-keys", "-t", pane_id, "Enter"]).await?;
        Ok(())
    }
}

/// Whether a raw token is a tmux key name (sent as a key) rather than
/// literal text (sent with `-l`).
pub(crate) fn is_key_token(token: &str) -> bool {
    if token.starts_with("C-") || token.starts_with("M-") || token.starts_with("S-") {
        return token.len() > 2;
    }
    if let Some(digits) = token.strip_prefix('F') {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
    }
    matches!(
        token,
        "Enter"
            | "Escape"
            | "Tab"
            | "BTab"
            | "Space"
            | "BSpace"
            | "Up"
            | "Down"
            | "Left"
            | "Right"
            | "Home"
            | "End"
            | "PageUp"
            | "PageDown"
    )
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
