// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fakes and builders for engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone};
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::monitor::Monitor;
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::pane::{PaneAdapter, PaneError};
use crate::registry::{SessionPatch, SessionRecord, SessionRegistry, SessionStatus};

/// Fixed local timestamp builder.
pub fn local(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> anyhow::Result<DateTime<Local>> {
    Local
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("unrepresentable local time"))
}

/// Manually driven clock.
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn at(start: DateTime<Local>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn set(&self, to: DateTime<Local>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}

/// A keystroke operation recorded by [`FakePane`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentKeys {
    Cooked(String),
    Raw(String),
    ContinueSequence,
}

/// Scripted pane: captures are served from a queue whose last entry is
/// sticky; keystrokes are recorded. An empty colored queue serves the
/// empty string, which the interactivity predicate treats as live.
pub struct FakePane {
    plain: Mutex<VecDeque<String>>,
    colored: Mutex<VecDeque<String>>,
    exists: AtomicBool,
    fail_captures: AtomicBool,
    sent: Mutex<Vec<SentKeys>>,
}

impl FakePane {
    pub fn new() -> Self {
        Self {
            plain: Mutex::new(VecDeque::new()),
            colored: Mutex::new(VecDeque::new()),
            exists: AtomicBool::new(true),
            fail_captures: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn push_plain(&self, capture: impl Into<String>) {
        self.plain.lock().push_back(capture.into());
    }

    pub fn push_colored(&self, capture: impl Into<String>) {
        self.colored.lock().push_back(capture.into());
    }

    /// Replace the queued plain captures with a single sticky capture.
    pub fn set_plain(&self, capture: impl Into<String>) {
        let mut queue = self.plain.lock();
        queue.clear();
        queue.push_back(capture.into());
    }

    pub fn set_exists(&self, exists: bool) {
        self.exists.store(exists, Ordering::SeqCst);
    }

    pub fn set_fail_captures(&self, fail: bool) {
        self.fail_captures.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentKeys> {
        self.sent.lock().clone()
    }

    fn next(queue: &Mutex<VecDeque<String>>) -> String {
        let mut queue = queue.lock();
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        }
    }
}

impl Default for FakePane {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaneAdapter for FakePane {
    async fn capture_plain(&self, _pane_id: &str) -> Result<String, PaneError> {
        if self.fail_captures.load(Ordering::SeqCst) {
            return Err(PaneError::Command { detail: "scripted failure".to_string() });
        }
        Ok(Self::next(&self.plain))
    }

    async fn capture_colored(&self, _pane_id: &str) -> Result<String, PaneError> {
        if self.fail_captures.load(Ordering::SeqCst) {
            return Err(PaneError::Command { detail: "scripted failure".to_string() });
        }
        Ok(Self::next(&self.colored))
    }

    async fn pane_exists(&self, _pane_id: &str) -> bool {
        self.exists.load(Ordering::SeqCst)
    }

    async fn send_cooked(&self, _pane_id: &str, text: &str) -> Result<(), PaneError> {
        self.sent.lock().push(SentKeys::Cooked(text.to_string()));
        Ok(())
    }

    async fn send_raw(&self, _pane_id: &str, token: &str) -> Result<(), PaneError> {
        self.sent.lock().push(SentKeys::Raw(token.to_string()));
        Ok(())
    }

    async fn send_continue_sequence(&self, _pane_id: &str) -> Result<(), PaneError> {
        self.sent.lock().push(SentKeys::ContinueSequence);
        Ok(())
    }
}

/// In-memory registry with the same merge semantics as the file driver.
#[derive(Default)]
pub struct MemoryRegistry {
    records: Mutex<HashMap<String, SessionRecord>>,
    fail: AtomicBool,
}

impl MemoryRegistry {
    pub fn insert(&self, record: SessionRecord) {
        self.records.lock().insert(record.id.clone(), record);
    }

    pub fn remove(&self, session_id: &str) {
        self.records.lock().remove(session_id);
    }

    pub fn record(&self, session_id: &str) -> Option<SessionRecord> {
        self.records.lock().get(session_id).cloned()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionRegistry for MemoryRegistry {
    async fn get(&self, session_id: &str) -> anyhow::Result<Option<SessionRecord>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("scripted registry failure");
        }
        Ok(self.records.lock().get(session_id).cloned())
    }

    async fn update(&self, session_id: &str, patch: SessionPatch) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("scripted registry failure");
        }
        if let Some(record) = self.records.lock().get_mut(session_id) {
            patch.apply(record);
        }
        Ok(())
    }
}

/// Notifier that records every delivery attempt; optionally fails them all.
#[derive(Default)]
pub struct RecordingNotifier {
    notes: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn notes(&self) -> Vec<Notification> {
        self.notes.lock().clone()
    }

    pub fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.notes.lock().iter().filter(|n| n.kind == kind).cloned().collect()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, note: Notification) -> anyhow::Result<()> {
        self.notes.lock().push(note);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("scripted notifier failure");
        }
        Ok(())
    }
}

/// Minimal active session record.
pub fn record(id: &str, pane_id: &str, created: DateTime<Local>) -> SessionRecord {
    SessionRecord {
        id: id.to_string(),
        name: id.to_string(),
        pane_id: pane_id.to_string(),
        created,
        status: SessionStatus::Active,
        quota_schedule: None,
    }
}

/// Fully wired engine over fakes.
pub struct Harness {
    pub pane: Arc<FakePane>,
    pub registry: Arc<MemoryRegistry>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub monitor: Monitor,
}

pub fn harness(start: DateTime<Local>) -> anyhow::Result<Harness> {
    harness_with_config(start, MonitorConfig::default())
}

pub fn harness_with_config(
    start: DateTime<Local>,
    config: MonitorConfig,
) -> anyhow::Result<Harness> {
    let pane = Arc::new(FakePane::new());
    let registry = Arc::new(MemoryRegistry::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::at(start));
    let monitor = Monitor::new(
        config,
        Arc::clone(&pane) as Arc<dyn PaneAdapter>,
        Arc::clone(&registry) as Arc<dyn SessionRegistry>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    )?;
    Ok(Harness { pane, registry, notifier, clock, monitor })
}
