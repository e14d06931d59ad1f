// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Notification categories delivered to the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Limit,
    Continued,
    Approval,
    TaskCompleted,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Continued => "continued",
            Self::Approval => "approval",
            Self::TaskCompleted => "task_completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, fire-and-forget notification keyed by session.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub session_id: String,
    pub session_name: String,
    pub message: String,
    /// Kind-specific payload (reset time, approval options, idle seconds).
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

/// Transport seam for outbound notifications.
///
/// The transport owns its own retry policy. The engine wraps every call so
/// a failed delivery is logged and swallowed; monitoring never halts on it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, note: Notification) -> anyhow::Result<()>;
}

/// Default driver: emits notifications as structured log events.
///
/// Lets the daemon run standalone; a chat transport replaces this at
/// construction time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, note: Notification) -> anyhow::Result<()> {
        info!(
            kind = note.kind.as_str(),
            session = %note.session_id,
            name = %note.session_name,
            metadata = %note.metadata,
            "{}",
            note.message
        );
        Ok(())
    }
}
