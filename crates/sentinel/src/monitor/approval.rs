// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval-dialog arbitration: validate that a dialog is live, dedup by
//! question text, and announce it once.

use tracing::{debug, info};

use crate::event::MonitorEventKind;
use crate::notify::NotificationKind;
use crate::patterns::{self, ApprovalOption};
use crate::registry::{SessionRecord, SessionStatus};

use super::cycle::SessionMonitor;

/// Run the approval detector on fresh output.
pub(crate) async fn check(
    sm: &mut SessionMonitor,
    record: &SessionRecord,
    slice: &str,
) -> anyhow::Result<()> {
    if !patterns::approval_dialog_present(slice) {
        return Ok(());
    }

    // Re-read with escapes: only a live dialog carries bright colors.
    let colored = sm.inner.pane.capture_colored(&record.pane_id).await?;
    if !patterns::interactive_approval(&colored) {
        debug!(session = %sm.session_id, "approval-looking text without live colors, ignoring");
        return Ok(());
    }

    let Some(info) = patterns::extract_approval_info(slice) else {
        return Ok(());
    };

    if sm.runtime.last_approval_question.as_deref() == Some(info.question.as_str()) {
        return Ok(());
    }
    sm.runtime.last_approval_question = Some(info.question.clone());

    sm.inner.emit(
        &sm.session_id,
        MonitorEventKind::ApprovalNeeded { question: info.question.clone(), tool: info.tool.clone() },
    );
    info!(session = %sm.session_id, tool = %info.tool, "approval dialog needs attention");

    let options =
        info.options.iter().map(format_option).collect::<Vec<_>>().join("\n");
    let message = format!("{}\n{}\n\n{options}", info.action, info.question);
    let metadata = serde_json::json!({
        "tool": info.tool,
        "action": info.action,
        "question": info.question,
        "options": info.options,
    });
    sm.inner.notify(record, NotificationKind::Approval, message, metadata).await;
    sm.inner.set_status(&record.id, SessionStatus::WaitingApproval).await?;
    Ok(())
}

/// Display form of one option: `**N.** label *(shortcut)*`.
pub(crate) fn format_option(option: &ApprovalOption) -> String {
    match &option.shortcut {
        Some(shortcut) => format!("**{}.** {} *({})*", option.number, option.label, shortcut),
        None => format!("**{}.** {}", option.number, option.label),
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
