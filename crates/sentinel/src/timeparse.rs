// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock parsing for reset notices and quota schedules.
//!
//! Accepts `H`, `H:MM`, optionally suffixed `am`/`pm`. Deadlines land on
//! today at that time, rolling to tomorrow when already past.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

/// Known session-window length. A reset claimed further out than this is a
/// misparse and yields no schedule.
pub const RESET_SANITY_CAP_HOURS: i64 = 5;

/// Parse `H`, `H:MM` with optional `am`/`pm` into 24-hour `(hour, minute)`.
///
/// 12-hour inputs: `pm` adds 12 except at 12pm; `12am` becomes 0. Rejects
/// hour > 23, minute > 59, and 12-hour values outside 1–12.
pub fn parse_clock_time(s: &str) -> Option<(u32, u32)> {
    let lower = s.trim().to_ascii_lowercase();
    let (body, meridiem) = match lower.strip_suffix("pm") {
        Some(rest) => (rest.trim_end(), Some(true)),
        None => match lower.strip_suffix("am") {
            Some(rest) => (rest.trim_end(), Some(false)),
            None => (lower.as_str(), None),
        },
    };

    let (hour_part, minute_part) = match body.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (body, None),
    };

    if hour_part.is_empty()
        || hour_part.len() > 2
        || !hour_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let mut hour: u32 = hour_part.parse().ok()?;

    let minute: u32 = match minute_part {
        Some(m) if m.len() == 2 && m.chars().all(|c| c.is_ascii_digit()) => m.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };
    if minute > 59 {
        return None;
    }

    match meridiem {
        Some(pm) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            if pm && hour != 12 {
                hour += 12;
            }
            if !pm && hour == 12 {
                hour = 0;
            }
        }
        None => {
            if hour > 23 {
                return None;
            }
        }
    }

    Some((hour, minute))
}

/// Concrete deadline for a reset-time string: today at that time, or
/// tomorrow if already past. Deadlines at or beyond the 5-hour sanity cap
/// are rejected (no schedule).
pub fn next_reset_deadline(s: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let (hour, minute) = parse_clock_time(s)?;
    let mut deadline = at_time(now.date_naive(), hour, minute)?;
    if deadline <= now {
        deadline = at_time(now.date_naive().succ_opt()?, hour, minute)?;
    }
    if deadline - now >= Duration::hours(RESET_SANITY_CAP_HOURS) {
        return None;
    }
    Some(deadline)
}

/// Next firing of a daily schedule: always tomorrow at the given time.
/// No sanity cap — the recurrence is a day long by construction.
pub fn next_daily_occurrence(s: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let (hour, minute) = parse_clock_time(s)?;
    at_time(now.date_naive().succ_opt()?, hour, minute)
}

fn at_time(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
#[path = "timeparse_tests.rs"]
mod tests;
