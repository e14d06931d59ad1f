// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{Duration, Timelike};

use crate::test_support::local;

use super::*;

#[yare::parameterized(
    bare_hour = { "8", Some((8, 0)) },
    bare_hour_24 = { "23", Some((23, 0)) },
    midnight_24 = { "0", Some((0, 0)) },
    padded = { "05:00", Some((5, 0)) },
    am = { "4am", Some((4, 0)) },
    pm = { "8pm", Some((20, 0)) },
    pm_with_minutes = { "3:45pm", Some((15, 45)) },
    pm_spaced = { "3:45 pm", Some((15, 45)) },
    uppercase = { "11:15PM", Some((23, 15)) },
    noon = { "12pm", Some((12, 0)) },
    midnight_12h = { "12am", Some((0, 0)) },
    hour_out_of_range = { "24", None },
    minute_out_of_range = { "7:60", None },
    meridiem_out_of_range = { "13pm", None },
    zero_with_meridiem = { "0am", None },
    single_digit_minutes = { "3:4", None },
    empty = { "", None },
    words = { "noon", None },
)]
fn parse_clock_time_cases(input: &str, expected: Option<(u32, u32)>) {
    assert_eq!(parse_clock_time(input), expected);
}

#[test]
fn deadline_later_today() -> anyhow::Result<()> {
    let now = local(2026, 3, 10, 13, 0)?;
    let deadline = next_reset_deadline("3:45pm", now);
    assert_eq!(deadline, local(2026, 3, 10, 15, 45).ok());
    Ok(())
}

#[test]
fn deadline_rolls_to_tomorrow_near_midnight() -> anyhow::Result<()> {
    let now = local(2026, 3, 10, 23, 30)?;
    let deadline = next_reset_deadline("1am", now);
    assert_eq!(deadline, local(2026, 3, 11, 1, 0).ok());
    Ok(())
}

#[test]
fn deadline_past_and_beyond_cap_is_rejected() -> anyhow::Result<()> {
    // 4am tomorrow is 17 hours out; far past the session-window length.
    let now = local(2026, 3, 10, 11, 0)?;
    assert_eq!(next_reset_deadline("4am", now), None);
    Ok(())
}

#[test]
fn deadline_exactly_at_cap_is_rejected() -> anyhow::Result<()> {
    let now = local(2026, 3, 10, 11, 0)?;
    assert_eq!(next_reset_deadline("4pm", now), None);
    Ok(())
}

#[test]
fn deadline_just_inside_cap_is_accepted() -> anyhow::Result<()> {
    let now = local(2026, 3, 10, 11, 1)?;
    assert_eq!(next_reset_deadline("4pm", now), local(2026, 3, 10, 16, 0).ok());
    Ok(())
}

#[test]
fn deadline_for_unparseable_input() -> anyhow::Result<()> {
    let now = local(2026, 3, 10, 11, 0)?;
    assert_eq!(next_reset_deadline("soon", now), None);
    Ok(())
}

#[test]
fn reset_time_round_trips_hour_and_minute() -> anyhow::Result<()> {
    let now = local(2026, 3, 10, 1, 0)?;
    let deadline =
        next_reset_deadline("4am", now).ok_or_else(|| anyhow::anyhow!("expected deadline"))?;
    assert_eq!((deadline.hour(), deadline.minute()), (4, 0));
    Ok(())
}

#[test]
fn daily_occurrence_is_always_tomorrow() -> anyhow::Result<()> {
    // Even when today's 05:00 has not passed yet.
    let now = local(2026, 3, 10, 2, 0)?;
    assert_eq!(next_daily_occurrence("05:00", now), local(2026, 3, 11, 5, 0).ok());
    Ok(())
}

#[test]
fn daily_occurrence_has_no_five_hour_cap() -> anyhow::Result<()> {
    let now = local(2026, 3, 10, 2, 0)?;
    let next = next_daily_occurrence("2:00", now);
    assert_eq!(next, local(2026, 3, 11, 2, 0).ok());
    let Some(next) = next else {
        return Err(anyhow::anyhow!("expected occurrence"));
    };
    assert!(next - now > Duration::hours(RESET_SANITY_CAP_HOURS));
    Ok(())
}

#[test]
fn daily_occurrence_rejects_invalid_ranges() -> anyhow::Result<()> {
    let now = local(2026, 3, 10, 2, 0)?;
    assert_eq!(next_daily_occurrence("25:00", now), None);
    assert_eq!(next_daily_occurrence("5:75", now), None);
    Ok(())
}
