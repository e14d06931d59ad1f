// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::broadcast;

/// In-process observation published by the monitoring engine.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorEvent {
    pub session_id: String,
    #[serde(flatten)]
    pub kind: MonitorEventKind,
    pub at: DateTime<Local>,
}

/// Event payloads, tagged with the wire-format event type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEventKind {
    LimitDetected { excerpt: String },
    ApprovalNeeded { question: String, tool: String },
    TaskCompleted { idle_secs: u64 },
    Error { message: String },
}

impl MonitorEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LimitDetected { .. } => "limit_detected",
            Self::ApprovalNeeded { .. } => "approval_needed",
            Self::TaskCompleted { .. } => "task_completed",
            Self::Error { .. } => "error",
        }
    }
}

/// Fan-out hub for [`MonitorEvent`]s.
///
/// Backed by a bounded broadcast channel: publishing never blocks the poll
/// loop, and slow subscribers lag rather than stall the engine.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MonitorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. A send with no live subscribers is not an error.
    pub fn publish(&self, event: MonitorEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
