// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One timed poll cycle: capture → analyze → act.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::event::MonitorEventKind;
use crate::notify::{Notification, NotificationKind};
use crate::patterns;
use crate::state::SessionRuntime;

use super::{approval, idle, limits, quota, MonitorInner};

/// Whether the poll task should keep ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CycleOutcome {
    Continue,
    Stop,
}

/// Single-writer driver for one session: owns the runtime state and runs
/// one cycle at a time.
pub(crate) struct SessionMonitor {
    pub(crate) inner: Arc<MonitorInner>,
    pub(crate) session_id: String,
    pub(crate) runtime: SessionRuntime,
}

impl SessionMonitor {
    pub(crate) fn new(inner: Arc<MonitorInner>, session_id: String) -> Self {
        Self { inner, session_id, runtime: SessionRuntime::default() }
    }

    /// Run one cycle, absorbing errors into the retry budget.
    pub(crate) async fn run_cycle(&mut self) -> CycleOutcome {
        match self.cycle().await {
            Ok(outcome) => {
                self.runtime.retry_count = 0;
                outcome
            }
            Err(err) => {
                self.runtime.retry_count += 1;
                if self.runtime.retry_count >= self.inner.config.max_retries {
                    let message = format!(
                        "monitoring failed after {} attempts: {err:#}",
                        self.runtime.retry_count
                    );
                    warn!(session = %self.session_id, "{message}");
                    self.inner
                        .emit(&self.session_id, MonitorEventKind::Error { message: message.clone() });
                    let note = Notification {
                        kind: NotificationKind::Error,
                        session_id: self.session_id.clone(),
                        session_name: self.session_id.clone(),
                        message,
                        metadata: serde_json::Value::Null,
                    };
                    if let Err(e) = self.inner.notifier.notify(note).await {
                        warn!(session = %self.session_id, "notification delivery failed: {e:#}");
                    }
                    CycleOutcome::Stop
                } else {
                    warn!(
                        session = %self.session_id,
                        attempt = self.runtime.retry_count,
                        "poll cycle failed: {err:#}"
                    );
                    CycleOutcome::Continue
                }
            }
        }
    }

    async fn cycle(&mut self) -> anyhow::Result<CycleOutcome> {
        let Some(record) = self.inner.registry.get(&self.session_id).await? else {
            debug!(session = %self.session_id, "session record missing, stopping monitor");
            return Ok(CycleOutcome::Stop);
        };

        if !self.inner.pane.pane_exists(&record.pane_id).await {
            // Final status is the supervisor's call; no notification here.
            info!(session = %self.session_id, pane = %record.pane_id, "pane gone");
            return Ok(CycleOutcome::Stop);
        }

        if let Some(deadline) = self.runtime.scheduled_reset {
            if self.inner.clock.now() >= deadline {
                limits::perform_continuation(self, &record).await?;
                return Ok(CycleOutcome::Continue);
            }
        }

        if record.quota_schedule.is_some() {
            quota::apply(self, &record).await?;
        }

        let current = self.inner.pane.capture_plain(&record.pane_id).await?;
        if current != self.runtime.last_output {
            let slice = patterns::new_slice(&current, &self.runtime.last_output).to_string();
            self.runtime.last_output_change = Some(self.inner.clock.now());
            self.runtime.last_output = current;
            // A genuine limit disables interactivity, so it outranks any
            // approval-looking text in the same capture.
            let limit_engaged = limits::check(self, &record, &slice).await?;
            if !limit_engaged {
                approval::check(self, &record, &slice).await?;
            }
        }

        idle::check(self, &record).await?;
        Ok(CycleOutcome::Continue)
    }
}

#[cfg(test)]
#[path = "cycle_tests.rs"]
mod tests;
