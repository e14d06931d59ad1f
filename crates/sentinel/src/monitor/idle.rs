// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idle/task-completion detection over quiescent panes.

use chrono::Duration;
use tracing::info;

use crate::event::MonitorEventKind;
use crate::notify::NotificationKind;
use crate::patterns;
use crate::registry::SessionRecord;

use super::cycle::SessionMonitor;

/// Quiescence required before the pane counts as idle. The boundary is
/// exclusive: exactly this many seconds does not fire.
pub(crate) const IDLE_WINDOW_SECS: i64 = 10;

/// Per-session cooldown between task-completed notifications.
pub(crate) const COMPLETION_COOLDOWN_SECS: i64 = 300;

/// Run the idle detector on the current snapshot.
pub(crate) async fn check(sm: &mut SessionMonitor, record: &SessionRecord) -> anyhow::Result<()> {
    if sm.runtime.awaiting_continuation {
        return Ok(());
    }
    let Some(changed_at) = sm.runtime.last_output_change else {
        return Ok(());
    };

    let now = sm.inner.clock.now();
    let idle = now - changed_at;
    if idle <= Duration::seconds(IDLE_WINDOW_SECS) {
        return Ok(());
    }

    let current = &sm.runtime.last_output;
    if !patterns::waiting_for_input(current) || !patterns::not_processing(current) {
        return Ok(());
    }

    if let Some(prev) = sm.runtime.last_completion_notice {
        if now - prev <= Duration::seconds(COMPLETION_COOLDOWN_SECS) {
            return Ok(());
        }
    }
    sm.runtime.last_completion_notice = Some(now);

    let idle_secs = idle.num_seconds().max(0) as u64;
    sm.inner.emit(&sm.session_id, MonitorEventKind::TaskCompleted { idle_secs });
    info!(session = %sm.session_id, idle_secs, "task appears complete");
    sm.inner
        .notify(
            record,
            NotificationKind::TaskCompleted,
            format!("Task appears complete; no output for {idle_secs}s."),
            serde_json::json!({ "idleDurationSeconds": idle_secs }),
        )
        .await;
    Ok(())
}

#[cfg(test)]
#[path = "idle_tests.rs"]
mod tests;
