//! Time parsing for CLI date filter flags.
//!
//! Accepts absolute timestamps and relative durations such as "24h" or "2w ago".

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Matches one or more duration components with an optional "ago": "24h", "1h30m", "2w ago"
static RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:\d+(?:mo|w|d|h|m|s))+)(?:\s*ago)?$").expect("valid relative regex")
});

static COMPONENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(mo|w|d|h|m|s)").expect("valid component regex"));

/// Parse a date filter value into an instant.
///
/// # Supported formats
/// - RFC3339: "2024-01-15T10:00:00Z"
/// - Date: "2024-01-15" (midnight UTC)
/// - Named: "today", "yesterday"
/// - Relative, always in the past: "24h", "7d", "1h30m", "2w ago", "1mo"
pub fn parse_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err("empty time expression".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let dt = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| format!("invalid date {raw:?}"))?;
        return Ok(Utc.from_utc_datetime(&dt));
    }

    let lower = raw.to_lowercase();
    match lower.as_str() {
        "today" => return Ok(start_of_day(now)),
        "yesterday" => return Ok(start_of_day(now - Duration::days(1))),
        _ => {}
    }

    if let Some(caps) = RELATIVE_RE.captures(&lower) {
        let duration = parse_duration(&caps[1])?;
        if duration <= Duration::zero() {
            return Err(format!("invalid relative time {raw:?}"));
        }
        return now
            .checked_sub_signed(duration)
            .ok_or_else(|| format!("relative time out of range {raw:?}"));
    }

    Err(format!("invalid time expression {raw:?}"))
}

fn parse_duration(input: &str) -> Result<Duration, String> {
    let out_of_range = || format!("duration out of range {input:?}");
    let mut total = Duration::zero();
    for caps in COMPONENT_RE.captures_iter(input) {
        let value: i64 = caps[1]
            .parse()
            .map_err(|_| format!("invalid number in {input:?}"))?;
        let component = match &caps[2] {
            // Approximate months as 30 days
            "mo" => value.checked_mul(30).and_then(Duration::try_days),
            "w" => Duration::try_weeks(value),
            "d" => Duration::try_days(value),
            "h" => Duration::try_hours(value),
            "m" => Duration::try_minutes(value),
            "s" => Duration::try_seconds(value),
            unit => return Err(format!("invalid time unit {unit:?}")),
        }
        .ok_or_else(out_of_range)?;
        total = total.checked_add(&component).ok_or_else(out_of_range)?;
    }
    Ok(total)
}

fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(dt)
}
