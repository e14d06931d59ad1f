// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session records and the registry seam, plus the file-backed driver.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lifecycle status persisted for each session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Waiting,
    WaitingApproval,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Waiting => "waiting",
            Self::WaitingApproval => "waiting_approval",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurring daily command staged and fired inside the pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaSchedule {
    /// Daily firing time, `H`, `H:MM`, optionally suffixed `am`/`pm`.
    pub time_of_day: String,
    /// Command text typed into the pane; may carry a `YYYY-MM-DD` date
    /// that is refreshed at each firing.
    pub command: String,
    /// Concrete wall-clock deadline for the next firing.
    pub next_execution: DateTime<Local>,
}

/// One session record, owned by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub name: String,
    pub pane_id: String,
    pub created: DateTime<Local>,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_schedule: Option<QuotaSchedule>,
}

/// Field-level merge applied atomically by the registry.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub quota_schedule: Option<QuotaSchedule>,
    pub clear_quota_schedule: bool,
}

impl SessionPatch {
    pub fn with_status(status: SessionStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn with_quota(schedule: QuotaSchedule) -> Self {
        Self { quota_schedule: Some(schedule), ..Self::default() }
    }

    pub fn drop_quota() -> Self {
        Self { clear_quota_schedule: true, ..Self::default() }
    }

    /// Merge this patch into a record.
    pub fn apply(&self, record: &mut SessionRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(ref schedule) = self.quota_schedule {
            record.quota_schedule = Some(schedule.clone());
        }
        if self.clear_quota_schedule {
            record.quota_schedule = None;
        }
    }
}

/// Lookup/update seam the engine consumes.
///
/// The engine reads records and requests merges; it tolerates eventual
/// consistency within a single poll cycle.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn get(&self, session_id: &str) -> anyhow::Result<Option<SessionRecord>>;

    /// Atomic field-level merge. Updating an unknown session is a no-op.
    async fn update(&self, session_id: &str, patch: SessionPatch) -> anyhow::Result<()>;
}

/// On-disk registry document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    sessions: Vec<SessionRecord>,
}

/// JSON-file registry with atomic saves (write tmp + rename).
pub struct FileRegistry {
    path: PathBuf,
    state: Mutex<RegistryFile>,
}

impl FileRegistry {
    /// Open an existing registry file, or start empty if none exists.
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("reading registry {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing registry {}", path.display()))?
        } else {
            RegistryFile::default()
        };
        Ok(Self { path, state: Mutex::new(state) })
    }

    /// Register a new session record and persist it.
    pub fn create(&self, name: &str, pane_id: &str) -> anyhow::Result<SessionRecord> {
        let record = SessionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            pane_id: pane_id.to_string(),
            created: Local::now(),
            status: SessionStatus::Active,
            quota_schedule: None,
        };
        let mut state = self.state.lock();
        state.sessions.push(record.clone());
        self.save(&state)?;
        Ok(record)
    }

    pub fn list(&self) -> Vec<SessionRecord> {
        self.state.lock().sessions.clone()
    }

    fn save(&self, state: &RegistryFile) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl SessionRegistry for FileRegistry {
    async fn get(&self, session_id: &str) -> anyhow::Result<Option<SessionRecord>> {
        let state = self.state.lock();
        Ok(state.sessions.iter().find(|s| s.id == session_id).cloned())
    }

    async fn update(&self, session_id: &str, patch: SessionPatch) -> anyhow::Result<()> {
        let mut state = self.state.lock();
        let Some(record) = state.sessions.iter_mut().find(|s| s.id == session_id) else {
            debug!(session = %session_id, "update for unknown session, ignoring");
            return Ok(());
        };
        patch.apply(record);
        self.save(&state)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
