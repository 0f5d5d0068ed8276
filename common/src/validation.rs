//! Pre-submit checks for the add/edit form.
//!
//! These run client-side against the currently known active items. The store
//! does not enforce them.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::countdown::local_day;
use crate::item::{FoodItem, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftProblem {
    EmptyName,
    /// Expiry calendar day is before today.
    PastDate,
    /// Another active item has the same name and expiry day.
    Duplicate,
}

impl DraftProblem {
    pub fn message(self) -> &'static str {
        match self {
            DraftProblem::EmptyName => "Name is required",
            DraftProblem::PastDate => "Expiry date cannot be in the past",
            DraftProblem::Duplicate => "An item with this name and expiry date already exists",
        }
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

pub fn is_past_date<Tz: TimeZone>(expiry: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    local_day(expiry, now) < now.date_naive()
}

/// `editing` excludes the item being edited from the comparison.
pub fn is_duplicate<Tz: TimeZone>(
    name: &str,
    expiry: &DateTime<Utc>,
    existing: &[FoodItem],
    editing: Option<&ItemId>,
    now: &DateTime<Tz>,
) -> bool {
    let day = local_day(expiry, now);
    existing
        .iter()
        .filter(|item| item.is_active())
        .filter(|item| Some(&item.id) != editing)
        .any(|item| same_name(&item.name, name) && local_day(&item.expiry_date, now) == day)
}

/// Every problem with a proposed `(name, expiry)`; empty when submittable.
pub fn check_draft<Tz: TimeZone>(
    name: &str,
    expiry: &DateTime<Utc>,
    existing: &[FoodItem],
    editing: Option<&ItemId>,
    now: &DateTime<Tz>,
) -> Vec<DraftProblem> {
    let mut problems = Vec::new();
    if name.trim().is_empty() {
        problems.push(DraftProblem::EmptyName);
    }
    if is_past_date(expiry, now) {
        problems.push(DraftProblem::PastDate);
    }
    if is_duplicate(name, expiry, existing, editing, now) {
        problems.push(DraftProblem::Duplicate);
    }
    problems
}
