// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session monitoring engine: one poll task per supervised session.
//!
//! Each session gets a dedicated tokio task driving exactly one in-flight
//! poll cycle, so per-session state needs no locking. Cycles across
//! sessions run independently; the only cross-session state is the handle
//! map guarded against concurrent start/stop.

pub mod approval;
pub mod cycle;
pub mod idle;
pub mod limits;
pub mod quota;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::event::{EventBus, MonitorEvent, MonitorEventKind};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::pane::PaneAdapter;
use crate::registry::{SessionPatch, SessionRecord, SessionRegistry, SessionStatus};

use self::cycle::{CycleOutcome, SessionMonitor};

/// Handle for one monitored session's poll task.
struct SessionHandle {
    generation: u64,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

pub(crate) struct MonitorInner {
    pub(crate) config: MonitorConfig,
    pub(crate) pane: Arc<dyn PaneAdapter>,
    pub(crate) registry: Arc<dyn SessionRegistry>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) events: EventBus,
    sessions: Mutex<HashMap<String, SessionHandle>>,
    next_generation: AtomicU64,
}

impl MonitorInner {
    pub(crate) fn emit(&self, session_id: &str, kind: MonitorEventKind) {
        self.events.publish(MonitorEvent {
            session_id: session_id.to_string(),
            kind,
            at: self.clock.now(),
        });
    }

    /// Deliver a notification, logging and swallowing any transport error.
    pub(crate) async fn notify(
        &self,
        record: &SessionRecord,
        kind: NotificationKind,
        message: String,
        metadata: serde_json::Value,
    ) {
        let note = Notification {
            kind,
            session_id: record.id.clone(),
            session_name: record.name.clone(),
            message,
            metadata,
        };
        if let Err(e) = self.notifier.notify(note).await {
            warn!(session = %record.id, "notification delivery failed: {e:#}");
        }
    }

    pub(crate) async fn set_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> anyhow::Result<()> {
        self.registry.update(session_id, SessionPatch::with_status(status)).await
    }

    /// Remove a finished task's handle, unless a newer task took the slot.
    fn remove_session(&self, session_id: &str, generation: u64) {
        let mut sessions = self.sessions.lock();
        if sessions.get(session_id).is_some_and(|h| h.generation == generation) {
            sessions.remove(session_id);
        }
    }
}

/// The monitoring engine.
///
/// Collaborators (pane adapter, registry, notifier, clock) are injected at
/// construction and shared by every session task.
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        pane: Arc<dyn PaneAdapter>,
        registry: Arc<dyn SessionRegistry>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(MonitorInner {
                config,
                pane,
                registry,
                notifier,
                clock,
                events: EventBus::default(),
                sessions: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        })
    }

    /// Subscribe to the in-process event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.events.subscribe()
    }

    /// Begin polling a session. A no-op when it is already monitored.
    pub fn start_monitoring(&self, session_id: &str) {
        let mut sessions = self.inner.sessions.lock();
        if sessions.contains_key(session_id) {
            debug!(session = %session_id, "already monitored");
            return;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let inner = Arc::clone(&self.inner);
        let id = session_id.to_string();

        let task = tokio::spawn(async move {
            let mut monitor = SessionMonitor::new(Arc::clone(&inner), id.clone());
            let mut interval = tokio::time::interval(inner.config.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                if monitor.run_cycle().await == CycleOutcome::Stop {
                    break;
                }
            }
            inner.remove_session(&id, generation);
            debug!(session = %id, "monitoring task finished");
        });

        sessions.insert(session_id.to_string(), SessionHandle { generation, shutdown, task });
        debug!(session = %session_id, "monitoring started");
    }

    /// Cancel a session's next tick. A cycle already in flight completes,
    /// so its side effects may still land.
    pub fn stop_monitoring(&self, session_id: &str) {
        let handle = self.inner.sessions.lock().remove(session_id);
        if let Some(handle) = handle {
            handle.shutdown.cancel();
            debug!(session = %session_id, "monitoring stopped");
        }
    }

    /// Cancel every session without waiting.
    pub fn stop_all(&self) {
        let handles: Vec<(String, SessionHandle)> = self.inner.sessions.lock().drain().collect();
        for (id, handle) in &handles {
            handle.shutdown.cancel();
            debug!(session = %id, "monitoring stopped");
        }
    }

    /// Cancel every session and wait for in-flight cycles to finish.
    pub async fn shutdown(&self) {
        let handles: Vec<(String, SessionHandle)> = self.inner.sessions.lock().drain().collect();
        for (_, handle) in &handles {
            handle.shutdown.cancel();
        }
        for (_, handle) in handles {
            let _ = handle.task.await;
        }
    }

    /// IDs of currently monitored sessions, sorted.
    pub fn active_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.sessions.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    #[cfg(test)]
    pub(crate) fn session_monitor(&self, session_id: &str) -> SessionMonitor {
        SessionMonitor::new(Arc::clone(&self.inner), session_id.to_string())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
