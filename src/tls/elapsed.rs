//! 相对时间："3 days ago" / "2 months from now"
//!
//! Each calendar field is subtracted on its own, so the result is an
//! approximation: 2023-12-31 → 2024-01-01 reads as "1 year".

use chrono::{DateTime, Datelike, Timelike, Utc};

pub fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Largest differing unit, or every differing unit when `full` is set.
pub fn time_elapsed(now: DateTime<Utc>, then: DateTime<Utc>, full: bool) -> String {
    let diff = |a: i64, b: i64| (a - b).abs();

    let year = diff(now.year() as i64, then.year() as i64);
    let month = diff(now.month() as i64, then.month() as i64);
    let day = diff(now.day() as i64, then.day() as i64);
    let hour = diff(now.hour() as i64, then.hour() as i64);
    let minute = diff(now.minute() as i64, then.minute() as i64);
    let second = diff(now.second() as i64, then.second() as i64);
    let week = day / 7;

    let parts: Vec<String> = [
        (year, "year"),
        (month, "month"),
        (week, "week"),
        (day, "day"),
        (hour, "hour"),
        (minute, "minute"),
        (second, "second"),
    ]
    .iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, unit)| format!("{} {}{}", n, unit, plural(*n)))
    .collect();

    if parts.is_empty() {
        return "just now".to_string();
    }

    let suffix = if now > then { "ago" } else { "from now" };
    if full {
        format!("{} {}", parts.join(", "), suffix)
    } else {
        format!("{} {}", parts[0], suffix)
    }
}
