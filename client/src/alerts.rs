use std::collections::HashSet;

use chrono::{DateTime, TimeZone};
use larder_common::alerts::{expiry_alerts, AlertKind, ExpiryAlert};
use larder_common::{FoodItem, ItemId};

/// Hands out each `(item, threshold)` alert at most once.
#[derive(Debug, Default)]
pub struct AlertScheduler {
    fired: HashSet<(ItemId, AlertKind)>,
}

impl AlertScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts due at `now` that have not been handed out before.
    pub fn due<Tz: TimeZone>(
        &mut self,
        items: &[FoodItem],
        now: &DateTime<Tz>,
        auto_delete: bool,
    ) -> Vec<ExpiryAlert> {
        expiry_alerts(items, now, auto_delete)
            .into_iter()
            .filter(|alert| self.fired.insert((alert.id.clone(), alert.kind)))
            .collect()
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }
}
