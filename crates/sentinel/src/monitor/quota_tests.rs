// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Local};

use crate::notify::NotificationKind;
use crate::registry::{QuotaSchedule, SessionRecord};
use crate::test_support::{harness, local, record, Harness, SentKeys};

const COMMAND: &str = "quota ping 2026-03-10";

fn quota_record(t0: DateTime<Local>, next_execution: DateTime<Local>) -> SessionRecord {
    let mut rec = record("s1", "%1", t0);
    rec.quota_schedule = Some(QuotaSchedule {
        time_of_day: "05:00".to_string(),
        command: COMMAND.to_string(),
        next_execution,
    });
    rec
}

fn setup(t0: DateTime<Local>, next_execution: DateTime<Local>) -> anyhow::Result<Harness> {
    let h = harness(t0)?;
    h.registry.insert(quota_record(t0, next_execution));
    Ok(h)
}

#[tokio::test]
async fn staging_waits_for_session_age() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 4, 0)?;
    let h = setup(t0, local(2026, 3, 11, 5, 0)?)?;
    let mut sm = h.monitor.session_monitor("s1");

    sm.run_cycle().await;
    assert!(h.pane.sent().is_empty());

    h.clock.advance_secs(5);
    sm.run_cycle().await;
    assert_eq!(h.pane.sent(), vec![SentKeys::Raw(COMMAND.to_string())]);
    assert!(sm.runtime.quota_command_sent);

    // The latch holds: no re-typing on later cycles.
    sm.run_cycle().await;
    assert_eq!(h.pane.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn fire_submits_and_rolls_the_schedule() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 4, 0)?;
    let h = setup(t0, local(2026, 3, 10, 5, 0)?)?;
    let mut sm = h.monitor.session_monitor("s1");

    h.clock.advance_secs(6);
    sm.run_cycle().await; // stage
    h.clock.set(local(2026, 3, 10, 5, 0)?);
    sm.run_cycle().await; // fire

    let sent = h.pane.sent();
    assert_eq!(
        sent,
        vec![SentKeys::Raw(COMMAND.to_string()), SentKeys::Raw("Enter".to_string())]
    );
    assert!(!sm.runtime.quota_command_sent);

    let schedule = h
        .registry
        .record("s1")
        .and_then(|r| r.quota_schedule)
        .ok_or_else(|| anyhow::anyhow!("schedule missing after fire"))?;
    assert_eq!(schedule.next_execution, local(2026, 3, 11, 5, 0)?);
    assert_eq!(schedule.command, "quota ping 2026-03-11");
    assert_eq!(schedule.time_of_day, "05:00");

    assert_eq!(h.notifier.of_kind(NotificationKind::Continued).len(), 1);
    Ok(())
}

#[tokio::test]
async fn fire_waits_for_the_deadline() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 4, 0)?;
    let h = setup(t0, local(2026, 3, 10, 5, 0)?)?;
    let mut sm = h.monitor.session_monitor("s1");

    h.clock.advance_secs(6);
    sm.run_cycle().await; // stage
    h.clock.set(local(2026, 3, 10, 4, 59)?);
    sm.run_cycle().await;

    // Staged but not submitted.
    assert_eq!(h.pane.sent(), vec![SentKeys::Raw(COMMAND.to_string())]);
    assert!(h.notifier.notes().is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_time_of_day_drops_the_schedule() -> anyhow::Result<()> {
    let t0 = local(2026, 3, 10, 4, 0)?;
    let h = harness(t0)?;
    let mut rec = quota_record(t0, local(2026, 3, 10, 5, 0)?);
    if let Some(schedule) = rec.quota_schedule.as_mut() {
        schedule.time_of_day = "99:99".to_string();
    }
    h.registry.insert(rec);
    let mut sm = h.monitor.session_monitor("s1");

    h.clock.advance_secs(6);
    sm.run_cycle().await; // stage
    h.clock.set(local(2026, 3, 10, 5, 0)?);
    sm.run_cycle().await; // fire, then drop

    assert_eq!(h.registry.record("s1").and_then(|r| r.quota_schedule), None);
    Ok(())
}
