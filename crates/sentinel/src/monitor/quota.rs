// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daily quota command: stage the text on the input line ahead of time,
//! press Enter when the window opens, then roll the schedule forward.

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::notify::NotificationKind;
use crate::patterns;
use crate::registry::{QuotaSchedule, SessionPatch, SessionRecord};
use crate::timeparse;

use super::cycle::SessionMonitor;

/// Sessions younger than this are still drawing their UI; staging into
/// them would race the client's own writes.
pub(crate) const STAGE_MIN_AGE_SECS: i64 = 5;

/// Apply the two-phase quota logic for a session carrying a schedule.
pub(crate) async fn apply(sm: &mut SessionMonitor, record: &SessionRecord) -> anyhow::Result<()> {
    let Some(schedule) = record.quota_schedule.as_ref() else {
        return Ok(());
    };
    let now = sm.inner.clock.now();

    // Stage phase: type the command (no submit) once per day, leaving it
    // visibly pending on the input line. Firing waits for a later cycle.
    if !sm.runtime.quota_command_sent {
        if now - record.created >= Duration::seconds(STAGE_MIN_AGE_SECS) {
            sm.inner.pane.send_raw(&record.pane_id, &schedule.command).await?;
            sm.runtime.quota_command_sent = true;
            debug!(session = %sm.session_id, "quota command staged on the input line");
        }
        return Ok(());
    }

    if now < schedule.next_execution {
        return Ok(());
    }

    // Fire phase: submit the staged command, roll the schedule to tomorrow,
    // refresh the date the command carries.
    sm.inner.pane.send_raw(&record.pane_id, "Enter").await?;
    sm.runtime.quota_command_sent = false;

    match timeparse::next_daily_occurrence(&schedule.time_of_day, now) {
        Some(next) => {
            let date = next.format("%Y-%m-%d").to_string();
            let command = patterns::refresh_dates(&schedule.command, &date);
            sm.inner
                .registry
                .update(
                    &record.id,
                    SessionPatch::with_quota(QuotaSchedule {
                        time_of_day: schedule.time_of_day.clone(),
                        command,
                        next_execution: next,
                    }),
                )
                .await?;
            info!(session = %sm.session_id, next = %next, "quota command fired");
            sm.inner
                .notify(
                    record,
                    NotificationKind::Continued,
                    format!(
                        "Daily quota command executed; next run {}.",
                        next.format("%Y-%m-%d %H:%M")
                    ),
                    serde_json::json!({ "nextExecution": next.to_rfc3339() }),
                )
                .await;
        }
        None => {
            warn!(
                session = %sm.session_id,
                time_of_day = %schedule.time_of_day,
                "invalid quota time of day, dropping schedule"
            );
            sm.inner.registry.update(&record.id, SessionPatch::drop_quota()).await?;
            sm.inner
                .notify(
                    record,
                    NotificationKind::Continued,
                    "Daily quota command executed; schedule dropped (unparseable time of day)."
                        .to_string(),
                    serde_json::Value::Null,
                )
                .await;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod tests;
