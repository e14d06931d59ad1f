// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Local};

/// In-memory runtime state for one monitored session.
///
/// Created by `start_monitoring`, destroyed by `stop_monitoring`, and only
/// ever touched by that session's poll task (single writer). The latches in
/// here are what make side effects at-most-once per logical event: the pane
/// is shared with a human user, so every keystroke decision must survive
/// re-observing the same screen on the next cycle.
#[derive(Debug, Default)]
pub struct SessionRuntime {
    /// Last full pane snapshot seen.
    pub last_output: String,
    /// When the pane content last differed from the previous capture.
    pub last_output_change: Option<DateTime<Local>>,
    /// Entry timestamp of the most recent limit episode.
    pub limit_detected_at: Option<DateTime<Local>>,
    /// True from limit detection until the continuation settles.
    pub awaiting_continuation: bool,
    /// One-shot latch: the continue sequence was already tried this episode.
    pub immediate_continue_attempted: bool,
    /// Cooldown anchor for limit re-detection.
    pub last_continuation: Option<DateTime<Local>>,
    /// Wall-clock deadline for a deferred continuation.
    pub scheduled_reset: Option<DateTime<Local>>,
    /// Daily latch: the quota command text is staged in the pane input line.
    pub quota_command_sent: bool,
    /// Cooldown anchor for task-completed notifications.
    pub last_completion_notice: Option<DateTime<Local>>,
    /// Dedup key for approval announcements.
    pub last_approval_question: Option<String>,
    /// Consecutive polling failures.
    pub retry_count: u32,
}

impl SessionRuntime {
    /// Close the current limit episode after a continuation lands.
    ///
    /// Records the cooldown anchor and resets the per-episode latches.
    pub fn settle_continuation(&mut self, now: DateTime<Local>) {
        self.last_continuation = Some(now);
        self.awaiting_continuation = false;
        self.immediate_continue_attempted = false;
    }
}
