// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::notify::NotificationKind;
use crate::registry::SessionStatus;
use crate::test_support::{harness, local, record};

use super::CycleOutcome;

const EDIT_DIALOG: &str = "Do you want to make this edit to tmux.ts?\n\
                           \u{276f} 1. Yes\n\
                           \x20  2. Yes, allow all edits during this session (shift+tab)\n\
                           \x20  3. No, and tell Claude what to do differently (esc)\n";

const EDIT_DIALOG_COLORED: &str =
    "\x1b[1mDo you want to make this edit to tmux.ts?\x1b[0m\n\x1b[36m\u{276f} 1. Yes\x1b[0m\n";

#[tokio::test]
async fn missing_record_stops_quietly() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 9, 0)?;
    let h = harness(t0)?;
    let mut events = h.monitor.subscribe();
    let mut sm = h.monitor.session_monitor("ghost");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Stop);
    assert!(events.try_recv().is_err());
    assert!(h.notifier.notes().is_empty());
    Ok(())
}

#[tokio::test]
async fn vanished_pane_stops_without_notification() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 9, 0)?;
    let h = harness(t0)?;
    h.registry.insert(record("s1", "%1", t0));
    h.pane.set_exists(false);
    let mut sm = h.monitor.session_monitor("s1");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Stop);
    assert!(h.notifier.notes().is_empty());
    // The supervisor owns the final status; the record is untouched.
    assert_eq!(h.registry.record("s1").map(|r| r.status), Some(SessionStatus::Active));
    Ok(())
}

#[tokio::test]
async fn sessions_list_row_is_not_a_live_limit() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 9, 0)?;
    let h = harness(t0)?;
    h.registry.insert(record("s1", "%1", t0));
    h.pane.push_plain(
        "  1. claude-main   5-hour limit reached \u{2219} resets 1am   2h ago\n  2. claude-aux    idle",
    );
    let mut events = h.monitor.subscribe();
    let mut sm = h.monitor.session_monitor("s1");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    assert!(events.try_recv().is_err());
    assert!(h.pane.sent().is_empty());
    assert!(h.notifier.notes().is_empty());
    Ok(())
}

#[tokio::test]
async fn interactive_approval_is_announced_once() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 9, 0)?;
    let h = harness(t0)?;
    h.registry.insert(record("s1", "%1", t0));
    h.pane.push_plain(EDIT_DIALOG);
    h.pane.push_colored(EDIT_DIALOG_COLORED);
    let mut events = h.monitor.subscribe();
    let mut sm = h.monitor.session_monitor("s1");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);

    let notes = h.notifier.of_kind(NotificationKind::Approval);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].metadata["tool"], "Edit");
    assert_eq!(notes[0].metadata["action"], "Edit tmux.ts");
    assert_eq!(
        notes[0].metadata["options"].as_array().map(Vec::len),
        Some(3)
    );
    assert!(notes[0]
        .message
        .contains("**2.** Yes, allow all edits during this session *(shift+tab)*"));
    assert_eq!(h.registry.record("s1").map(|r| r.status), Some(SessionStatus::WaitingApproval));
    assert_eq!(events.try_recv()?.kind.as_str(), "approval_needed");

    // A redraw with the same question is deduplicated.
    h.pane.set_plain(
        "Do you want to make this edit to tmux.ts?\n\n\u{276f} 1. Yes\n\
         \x20  2. Yes, allow all edits during this session (shift+tab)\n\
         \x20  3. No, and tell Claude what to do differently (esc)\n",
    );
    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    assert_eq!(h.notifier.of_kind(NotificationKind::Approval).len(), 1);
    Ok(())
}

#[tokio::test]
async fn pasted_dialog_text_is_ignored() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 9, 0)?;
    let h = harness(t0)?;
    h.registry.insert(record("s1", "%1", t0));
    h.pane.push_plain(EDIT_DIALOG);
    // Colored capture has escapes, but the dialog lines render dim.
    h.pane.push_colored(
        "\x1b[2mDo you want to make this edit to tmux.ts?\x1b[0m\n\x1b[2m\u{276f} 1. Yes\x1b[0m\n",
    );
    let mut sm = h.monitor.session_monitor("s1");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    assert!(h.notifier.notes().is_empty());
    assert!(sm.runtime.last_approval_question.is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn limit_outranks_approval_in_the_same_capture() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 11, 0)?;
    let h = harness(t0)?;
    h.registry.insert(record("s1", "%1", t0));
    h.pane.push_plain(
        "5-hour limit reached. Your limit resets at 3:45pm\nDo you want to proceed?\n\u{276f} 1. Yes\n> ",
    );
    let mut sm = h.monitor.session_monitor("s1");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);

    assert_eq!(h.notifier.of_kind(NotificationKind::Limit).len(), 1);
    assert!(h.notifier.of_kind(NotificationKind::Approval).is_empty());
    Ok(())
}

#[tokio::test]
async fn retry_budget_exhaustion_stops_with_error() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 9, 0)?;
    let h = harness(t0)?;
    h.registry.insert(record("s1", "%1", t0));
    h.pane.set_fail_captures(true);
    let mut events = h.monitor.subscribe();
    let mut sm = h.monitor.session_monitor("s1");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    assert_eq!(sm.run_cycle().await, CycleOutcome::Stop);

    assert_eq!(events.try_recv()?.kind.as_str(), "error");
    assert_eq!(h.notifier.of_kind(NotificationKind::Error).len(), 1);
    Ok(())
}

#[tokio::test]
async fn successful_cycle_resets_the_retry_count() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 9, 0)?;
    let h = harness(t0)?;
    h.registry.insert(record("s1", "%1", t0));
    h.pane.set_fail_captures(true);
    let mut sm = h.monitor.session_monitor("s1");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);

    h.pane.set_fail_captures(false);
    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    assert_eq!(sm.runtime.retry_count, 0);

    // The budget starts over after a clean cycle.
    h.pane.set_fail_captures(true);
    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    Ok(())
}

#[tokio::test]
async fn registry_errors_count_toward_the_budget() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 9, 0)?;
    let h = harness(t0)?;
    h.registry.insert(record("s1", "%1", t0));
    h.registry.set_fail(true);
    let mut sm = h.monitor.session_monitor("s1");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);
    assert_eq!(sm.run_cycle().await, CycleOutcome::Stop);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn notifier_failures_never_halt_monitoring() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 11, 0)?;
    let h = harness(t0)?;
    h.registry.insert(record("s1", "%1", t0));
    h.notifier.set_fail(true);
    h.pane.push_plain("5-hour limit reached. Your limit resets at 3:45pm\n> ");
    let mut sm = h.monitor.session_monitor("s1");

    assert_eq!(sm.run_cycle().await, CycleOutcome::Continue);

    // The delivery was attempted, failed, and swallowed.
    assert_eq!(h.notifier.of_kind(NotificationKind::Limit).len(), 1);
    assert_eq!(sm.runtime.retry_count, 0);
    assert_eq!(h.registry.record("s1").map(|r| r.status), Some(SessionStatus::Waiting));
    Ok(())
}
