use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::countdown::{days_until_expiry, days_until_trash_clear};
use crate::error::TrackerError;
use crate::item::FoodItem;

/// Items this many days (or more) past their expiry day are swept into the trash.
pub const AUTO_EXPIRE_AFTER_DAYS: i64 = -1;

/// Where an item sits in its lifecycle. A purged item no longer exists, so
/// it has no state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemState {
    Active,
    Deleted,
}

/// A mutation that may be applied to an existing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Active → Active, fields only.
    Update,
    /// Active → Deleted.
    SoftDelete,
    /// Deleted → Active.
    Restore,
    /// Deleted → gone.
    Purge,
}

impl Transition {
    /// The state an item must be in for this transition to apply.
    pub fn requires(self) -> ItemState {
        match self {
            Transition::Update | Transition::SoftDelete => ItemState::Active,
            Transition::Restore | Transition::Purge => ItemState::Deleted,
        }
    }

    /// Resulting state, `None` when the record ceases to exist.
    pub fn target(self) -> Option<ItemState> {
        match self {
            Transition::Update | Transition::Restore => Some(ItemState::Active),
            Transition::SoftDelete => Some(ItemState::Deleted),
            Transition::Purge => None,
        }
    }

    /// Whether the authorization gate is consulted before this transition.
    pub fn is_gated(self) -> bool {
        matches!(self, Transition::Update | Transition::SoftDelete)
    }

    fn not_found_message(self) -> &'static str {
        match self {
            Transition::Update | Transition::SoftDelete => "Food item not found",
            Transition::Restore => "Food item not found or not deleted",
            Transition::Purge => "Food item not found in trash",
        }
    }

    pub fn not_found(self) -> TrackerError {
        TrackerError::not_found(self.not_found_message())
    }
}

impl ItemState {
    pub fn can_apply(self, transition: Transition) -> bool {
        transition.requires() == self
    }
}

/// Check that `item` exists and is in the right state for `transition`.
///
/// A wrong-state item is reported as not found, the same as a missing one.
pub fn check_transition(
    item: Option<&FoodItem>,
    transition: Transition,
) -> Result<&FoodItem, TrackerError> {
    match item {
        Some(item) if item.state().can_apply(transition) => Ok(item),
        _ => Err(transition.not_found()),
    }
}

/// Active items the auto-expire sweep should move to the trash.
pub fn sweep_candidates<'a, Tz: TimeZone>(
    items: &'a [FoodItem],
    now: &DateTime<Tz>,
) -> Vec<&'a FoodItem> {
    items
        .iter()
        .filter(|item| item.is_active())
        .filter(|item| days_until_expiry(&item.expiry_date, now) <= AUTO_EXPIRE_AFTER_DAYS)
        .collect()
}

/// Trashed items whose retention window has run out.
pub fn purge_candidates<'a, Tz: TimeZone>(
    items: &'a [FoodItem],
    now: &DateTime<Tz>,
    retention_days: u64,
) -> Vec<&'a FoodItem> {
    items
        .iter()
        .filter(|item| item.is_deleted)
        .filter(|item| match item.deleted_at {
            Some(at) => days_until_trash_clear(&at, now, retention_days) == 0,
            None => false,
        })
        .collect()
}

/// `deleted_at` is set if and only if the item is deleted.
pub fn is_consistent(item: &FoodItem) -> bool {
    item.is_deleted == item.deleted_at.is_some()
}

/// Apply a soft delete in place, checking state first.
pub fn soft_delete(item: &mut FoodItem, at: DateTime<Utc>) -> Result<(), TrackerError> {
    check_transition(Some(&*item), Transition::SoftDelete)?;
    item.mark_deleted(at);
    Ok(())
}

/// Apply a restore in place, checking state first.
pub fn restore(item: &mut FoodItem) -> Result<(), TrackerError> {
    check_transition(Some(&*item), Transition::Restore)?;
    item.mark_restored();
    Ok(())
}
