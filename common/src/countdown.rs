//! Countdown arithmetic between an expiry instant and "now".
//!
//! Day-level values are differences between calendar days, each instant
//! truncated to midnight in the observer's timezone (the zone of `now`).
//! Hour-level values use full timestamp precision, so an item expiring at
//! 00:30 tomorrow is one day away at 23:00 today with two hours remaining.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const MILLIS_PER_HOUR: i64 = 3_600_000;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Trash entries become eligible for purge this many days after deletion.
pub const DEFAULT_TRASH_RETENTION_DAYS: u64 = 14;

fn ceil_div(n: i64, d: i64) -> i64 {
    let q = n.div_euclid(d);
    if n.rem_euclid(d) == 0 {
        q
    } else {
        q + 1
    }
}

/// Calendar day of `at` as seen from `now`'s timezone.
pub fn local_day<Tz: TimeZone>(at: &DateTime<Utc>, now: &DateTime<Tz>) -> NaiveDate {
    at.with_timezone(&now.timezone()).date_naive()
}

/// Whole calendar days from today until the expiry day. Negative once past.
pub fn days_until_expiry<Tz: TimeZone>(expiry: &DateTime<Utc>, now: &DateTime<Tz>) -> i64 {
    (local_day(expiry, now) - now.date_naive()).num_days()
}

/// Hours until expiry, rounded up. Only meaningful on the expiry day itself.
pub fn hours_until_expiry<Tz: TimeZone>(expiry: &DateTime<Utc>, now: &DateTime<Tz>) -> i64 {
    let remaining = *expiry - now.with_timezone(&Utc);
    ceil_div(remaining.num_milliseconds(), MILLIS_PER_HOUR)
}

/// Days until expiry at full precision, rounded up.
///
/// This is the distance the authorization gate judges. Unlike
/// [`days_until_expiry`] it ignores midnight, so an item 15 days and two
/// hours out counts as 16.
pub fn gate_days<Tz: TimeZone>(expiry: &DateTime<Utc>, now: &DateTime<Tz>) -> i64 {
    let remaining = *expiry - now.with_timezone(&Utc);
    ceil_div(remaining.num_milliseconds(), MILLIS_PER_DAY)
}

pub fn is_expired<Tz: TimeZone>(expiry: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    days_until_expiry(expiry, now) < 0
}

/// Days left before a trashed item may be auto-purged, never below zero.
pub fn days_until_trash_clear<Tz: TimeZone>(
    deleted_at: &DateTime<Utc>,
    now: &DateTime<Tz>,
    retention_days: u64,
) -> i64 {
    let deleted_day = local_day(deleted_at, now);
    let clear_day = deleted_day
        .checked_add_days(Days::new(retention_days))
        .unwrap_or(NaiveDate::MAX);
    (clear_day - now.date_naive()).num_days().max(0)
}

/// Human-readable trash countdown.
pub fn trash_label<Tz: TimeZone>(
    deleted_at: &DateTime<Utc>,
    now: &DateTime<Tz>,
    retention_days: u64,
) -> String {
    match days_until_trash_clear(deleted_at, now, retention_days) {
        0 => "Auto-clear pending".to_string(),
        1 => "Auto-clear in 1 day".to_string(),
        n => format!("Auto-clear in {n} days"),
    }
}

/// Urgency tier. Ordered: a later variant never has fewer days remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownStatus {
    /// Expiry day is in the past.
    Expired,
    /// 0 to 3 days left.
    Urgent,
    /// 4 to 15 days left.
    Warning,
    Normal,
}

impl CountdownStatus {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => CountdownStatus::Expired,
            0..=3 => CountdownStatus::Urgent,
            4..=15 => CountdownStatus::Warning,
            _ => CountdownStatus::Normal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CountdownStatus::Expired => "expired",
            CountdownStatus::Urgent => "urgent",
            CountdownStatus::Warning => "warning",
            CountdownStatus::Normal => "normal",
        }
    }
}

/// Derived days/hours remaining for one item at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
}

impl Countdown {
    pub fn between<Tz: TimeZone>(expiry: &DateTime<Utc>, now: &DateTime<Tz>) -> Self {
        Countdown {
            days: days_until_expiry(expiry, now),
            hours: hours_until_expiry(expiry, now),
        }
    }

    pub fn status(&self) -> CountdownStatus {
        CountdownStatus::from_days(self.days)
    }

    pub fn is_expired(&self) -> bool {
        self.days < 0
    }

    pub fn label(&self) -> String {
        match (self.days, self.hours) {
            (d, _) if d < 0 => "Expired".to_string(),
            (0, h) if h <= 0 => "Expired".to_string(),
            (0, 1) => "1 hour".to_string(),
            (0, h) => format!("{h} hours"),
            (1, _) => "1 day".to_string(),
            (d, _) => format!("{d} days"),
        }
    }
}
