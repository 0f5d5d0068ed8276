use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::countdown::days_until_expiry;
use crate::item::{FoodItem, ItemId};

/// Number of days ahead the "expiring soon" list looks.
pub const EXPIRING_SOON_DAYS: i64 = 3;

/// Which threshold an alert was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    Expired,
    ExpiresIn3Days,
    ExpiresIn8Days,
    ExpiresIn15Days,
}

impl AlertKind {
    fn for_days(days: i64, include_expired: bool) -> Option<Self> {
        match days {
            3 => Some(AlertKind::ExpiresIn3Days),
            8 => Some(AlertKind::ExpiresIn8Days),
            15 => Some(AlertKind::ExpiresIn15Days),
            d if d <= 0 && include_expired => Some(AlertKind::Expired),
            _ => None,
        }
    }
}

/// A user-facing alert for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryAlert {
    pub id: ItemId,
    pub name: String,
    pub kind: AlertKind,
}

impl ExpiryAlert {
    pub fn message(&self) -> String {
        match self.kind {
            AlertKind::Expired => format!("{} has expired!", self.name),
            AlertKind::ExpiresIn3Days => {
                format!("{} expires in 3 days! Please double check again.", self.name)
            }
            AlertKind::ExpiresIn8Days => format!("{} expires in 8 days!", self.name),
            AlertKind::ExpiresIn15Days => format!(
                "{} expires in 15 days. Stand by, don't forget to stock out!",
                self.name
            ),
        }
    }
}

/// Alerts due for the active items at `now`.
///
/// `Expired` alerts are only produced when the auto-expire sweep is off;
/// otherwise those items are about to be moved to the trash anyway.
pub fn expiry_alerts<Tz: TimeZone>(
    items: &[FoodItem],
    now: &DateTime<Tz>,
    auto_delete: bool,
) -> Vec<ExpiryAlert> {
    items
        .iter()
        .filter(|item| item.is_active())
        .filter_map(|item| {
            let days = days_until_expiry(&item.expiry_date, now);
            AlertKind::for_days(days, !auto_delete).map(|kind| ExpiryAlert {
                id: item.id.clone(),
                name: item.name.clone(),
                kind,
            })
        })
        .collect()
}

/// Active items expiring within the next three days, soonest first.
pub fn expiring_soon<'a, Tz: TimeZone>(
    items: &'a [FoodItem],
    now: &DateTime<Tz>,
) -> Vec<&'a FoodItem> {
    let mut soon: Vec<&FoodItem> = items
        .iter()
        .filter(|item| item.is_active())
        .filter(|item| {
            let d = days_until_expiry(&item.expiry_date, now);
            (0..=EXPIRING_SOON_DAYS).contains(&d)
        })
        .collect();
    soon.sort_by_key(|item| item.expiry_date);
    soon
}

/// "Auto-deleted: a, b, c and 2 more".
pub fn auto_delete_summary<S: AsRef<str>>(names: &[S]) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    let shown: Vec<&str> = names.iter().take(3).map(AsRef::as_ref).collect();
    let mut summary = format!("Auto-deleted: {}", shown.join(", "));
    if names.len() > 3 {
        summary.push_str(&format!(" and {} more", names.len() - 3));
    }
    Some(summary)
}
