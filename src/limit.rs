//! Parsing of flexible `limit` expressions into message-window parameters.
//!
//! A limit is either a plain count (`"50"`) or a relative time window
//! (`"1d"`, `"2w"`, `"3m"` with months counted as 30 days).

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

/// Count used when the expression cannot be parsed.
pub const DEFAULT_LIMIT: u32 = 50;

/// Count used for time-window expressions, and the ceiling for plain counts.
pub const MAX_LIMIT: u32 = 1000;

/// Resolved window: at most `limit` messages, optionally bounded in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWindow {
    /// Maximum number of messages to request.
    pub limit: u32,
    /// Earliest timestamp (Unix seconds, `secs.micros`).
    pub oldest: Option<String>,
    /// Latest timestamp (Unix seconds, `secs.micros`).
    pub latest: Option<String>,
}

impl MessageWindow {
    fn count(limit: u32) -> Self {
        Self {
            limit,
            oldest: None,
            latest: None,
        }
    }
}

/// Parse `expr` relative to the current time.
#[must_use]
pub fn parse_limit(expr: &str) -> MessageWindow {
    parse_limit_at(expr, Utc::now())
}

/// Parse `expr` relative to `now`.
#[must_use]
pub fn parse_limit_at(expr: &str, now: DateTime<Utc>) -> MessageWindow {
    let expr = expr.trim();

    if !expr.is_empty() && expr.bytes().all(|b| b.is_ascii_digit()) {
        let limit = match expr.parse::<u64>() {
            Ok(n) if n <= u64::from(MAX_LIMIT) => u32::try_from(n).unwrap_or(MAX_LIMIT),
            _ => {
                warn!(requested = expr, clamped = MAX_LIMIT, "limit above maximum");
                MAX_LIMIT
            }
        };
        return MessageWindow::count(limit);
    }

    match relative_window(expr).and_then(|span| now.checked_sub_signed(span)) {
        Some(oldest) => MessageWindow {
            limit: MAX_LIMIT,
            oldest: Some(unix_seconds(oldest)),
            latest: None,
        },
        None => MessageWindow::count(DEFAULT_LIMIT),
    }
}

/// Leading `<digits><d|w|m>`; trailing text after the unit is ignored.
fn relative_window(expr: &str) -> Option<Duration> {
    let digits_end = expr.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let value: i64 = expr[..digits_end].parse().ok()?;
    let days = match expr[digits_end..].chars().next()? {
        'd' => value,
        'w' => value.checked_mul(7)?,
        'm' => value.checked_mul(30)?,
        _ => return None,
    };
    Duration::try_days(days)
}

/// Slack-style `secs.micros` timestamp.
fn unix_seconds(at: DateTime<Utc>) -> String {
    format!("{}.{:06}", at.timestamp(), at.timestamp_subsec_micros())
}
