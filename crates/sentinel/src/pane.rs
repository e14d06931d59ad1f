// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use async_trait::async_trait;

/// Error surfaced by a pane driver to the poll loop.
///
/// Every variant is transient from the engine's point of view: the cycle
/// aborts, the failure counts toward the retry budget, and the next cycle
/// tries again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneError {
    /// The multiplexer CLI could not be spawned or exited uncleanly.
    Command { detail: String },
    /// The operation did not complete within its deadline.
    Timeout,
}

impl fmt::Display for PaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command { detail } => write!(f, "pane command failed: {detail}"),
            Self::Timeout => f.write_str("pane operation timed out"),
        }
    }
}

impl std::error::Error for PaneError {}

/// Operations the engine requires from any pane binding.
///
/// Implementations address panes by the opaque `pane_id` stored in the
/// session record; the engine never interprets it.
#[async_trait]
pub trait PaneAdapter: Send + Sync {
    /// Full visible pane content with escape sequences stripped.
    async fn capture_plain(&self, pane_id: &str) -> Result<String, PaneError>;

    /// Full visible pane content with escape sequences preserved.
    async fn capture_colored(&self, pane_id: &str) -> Result<String, PaneError>;

    /// Whether the pane is still addressable. Drivers apply a hard ~5 s
    /// deadline and report timeout as gone.
    async fn pane_exists(&self, pane_id: &str) -> bool;

    /// Type `text` followed by a submit key.
    async fn send_cooked(&self, pane_id: &str, text: &str) -> Result<(), PaneError>;

    /// Type literal keys (`"1"`, `"Enter"`, `"C-u"`) without a submit.
    async fn send_raw(&self, pane_id: &str, token: &str) -> Result<(), PaneError>;

    /// Clear the input line, type `continue`, submit — with short pauses so
    /// the pane has time to render between keystrokes.
    async fn send_continue_sequence(&self, pane_id: &str) -> Result<(), PaneError>;
}
