// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Usage-limit recovery: detect the notice, try to continue immediately,
//! otherwise schedule a continuation for the advertised reset time.

use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::{debug, info};

use crate::event::MonitorEventKind;
use crate::notify::NotificationKind;
use crate::patterns;
use crate::registry::{SessionRecord, SessionStatus};
use crate::timeparse;

use super::cycle::SessionMonitor;

/// Re-detection cooldown after a continuation lands.
pub(crate) const CONTINUATION_COOLDOWN_SECS: i64 = 300;

/// Settle time between sending `continue` and re-reading the pane.
const IMMEDIATE_CONTINUE_WAIT: StdDuration = StdDuration::from_secs(3);

/// Window inspected to decide whether limit text is live or scrollback.
const LIMIT_TAIL_LINES: usize = 15;

/// Below this much fresh output, the pane is considered unchanged.
const SMALL_DELTA_CHARS: usize = 50;

/// Reset-time string reported when no time could be extracted.
pub(crate) const MONITORING_SENTINEL: &str = "Monitoring for availability";

/// Outcome of an immediate continue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContinueOutcome {
    Resolved,
    Failed,
}

enum AttemptOutcome {
    Resolved,
    Failed { after: String },
}

/// Run the limit detector on fresh output. Returns true when limit text
/// with an active terminal was seen, whether or not this cycle acted on it.
pub(crate) async fn check(
    sm: &mut SessionMonitor,
    record: &SessionRecord,
    slice: &str,
) -> anyhow::Result<bool> {
    if !patterns::limit_present(slice) || !patterns::active_terminal(slice) {
        return Ok(false);
    }

    // One pending continuation per episode: re-detections short-circuit
    // until the continuation settles.
    if sm.runtime.awaiting_continuation {
        return Ok(true);
    }

    let now = sm.inner.clock.now();
    if let Some(last) = sm.runtime.last_continuation {
        if now - last <= Duration::seconds(CONTINUATION_COOLDOWN_SECS) {
            debug!(session = %sm.session_id, "limit text within continuation cooldown, ignoring");
            return Ok(true);
        }
    }

    sm.runtime.limit_detected_at = Some(now);
    sm.runtime.awaiting_continuation = true;
    let excerpt = patterns::limit_line(slice).unwrap_or_default().to_string();
    sm.inner.emit(&sm.session_id, MonitorEventKind::LimitDetected { excerpt });
    info!(session = %sm.session_id, "usage limit detected");

    if sm.runtime.immediate_continue_attempted {
        schedule(sm, record, slice).await?;
        return Ok(true);
    }

    sm.runtime.immediate_continue_attempted = true;
    match immediate_attempt(sm, record).await {
        Ok(AttemptOutcome::Resolved) => resolve(sm, record).await?,
        Ok(AttemptOutcome::Failed { after }) => schedule(sm, record, &after).await?,
        Err(err) => {
            // A failed attempt must not leave the episode latched open.
            sm.runtime.awaiting_continuation = false;
            return Err(err);
        }
    }
    Ok(true)
}

/// Send the continue sequence and classify the pane's reaction.
async fn immediate_attempt(
    sm: &mut SessionMonitor,
    record: &SessionRecord,
) -> anyhow::Result<AttemptOutcome> {
    let before = sm.inner.pane.capture_plain(&record.pane_id).await?;
    sm.inner.pane.send_continue_sequence(&record.pane_id).await?;
    tokio::time::sleep(IMMEDIATE_CONTINUE_WAIT).await;
    let after = sm.inner.pane.capture_plain(&record.pane_id).await?;

    match classify_continue_attempt(&before, &after) {
        ContinueOutcome::Resolved => Ok(AttemptOutcome::Resolved),
        // `after` is the richer capture for reset-time extraction.
        ContinueOutcome::Failed => Ok(AttemptOutcome::Failed { after }),
    }
}

/// Decide whether the continue attempt resumed the session.
///
/// Limit text still present with barely any new output means the notice is
/// live. With substantial new output, only the last few lines decide:
/// limit text above them is scrolled history.
pub(crate) fn classify_continue_attempt(before: &str, after: &str) -> ContinueOutcome {
    if !patterns::limit_present(after) {
        return ContinueOutcome::Resolved;
    }
    let fresh = patterns::new_slice(after, before);
    if fresh.chars().count() < SMALL_DELTA_CHARS {
        return ContinueOutcome::Failed;
    }
    let tail = patterns::last_lines(after, LIMIT_TAIL_LINES);
    if patterns::limit_present(tail) && patterns::active_terminal(tail) {
        ContinueOutcome::Failed
    } else {
        ContinueOutcome::Resolved
    }
}

/// The immediate attempt worked: close the episode quietly.
async fn resolve(sm: &mut SessionMonitor, record: &SessionRecord) -> anyhow::Result<()> {
    let now = sm.inner.clock.now();
    sm.runtime.settle_continuation(now);
    sm.inner.set_status(&record.id, SessionStatus::Active).await?;
    info!(session = %sm.session_id, "limit cleared by immediate continue");
    Ok(())
}

/// Defer the continuation: extract a reset time, arm the schedule when one
/// parses, and announce the episode exactly once.
async fn schedule(sm: &mut SessionMonitor, record: &SessionRecord, text: &str) -> anyhow::Result<()> {
    let now = sm.inner.clock.now();
    let raw = patterns::extract_reset_time(text);
    match raw.as_deref().and_then(|s| timeparse::next_reset_deadline(s, now)) {
        Some(deadline) => {
            sm.runtime.scheduled_reset = Some(deadline);
            info!(session = %sm.session_id, deadline = %deadline, "continuation scheduled");
        }
        None => {
            info!(
                session = %sm.session_id,
                reset = raw.as_deref().unwrap_or("none"),
                "no usable reset deadline"
            );
        }
    }

    let reset_display = raw.unwrap_or_else(|| MONITORING_SENTINEL.to_string());
    let message = format!("Usage limit reached. Reset: {reset_display}");
    sm.inner
        .notify(
            record,
            NotificationKind::Limit,
            message,
            serde_json::json!({ "resetTime": reset_display }),
        )
        .await;
    sm.inner.set_status(&record.id, SessionStatus::Waiting).await?;
    Ok(())
}

/// Fire a scheduled continuation once its deadline has passed.
pub(crate) async fn perform_continuation(
    sm: &mut SessionMonitor,
    record: &SessionRecord,
) -> anyhow::Result<()> {
    sm.inner.pane.send_continue_sequence(&record.pane_id).await?;
    // Cleared only after the keystrokes land; a transient send failure
    // leaves the gate armed for the next cycle.
    sm.runtime.scheduled_reset = None;
    let now = sm.inner.clock.now();
    sm.runtime.settle_continuation(now);
    sm.inner.set_status(&record.id, SessionStatus::Active).await?;
    sm.inner
        .notify(
            record,
            NotificationKind::Continued,
            "Scheduled continuation sent; session resumed.".to_string(),
            serde_json::Value::Null,
        )
        .await;
    info!(session = %sm.session_id, "scheduled continuation performed");
    Ok(())
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
