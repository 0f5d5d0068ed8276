use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::countdown::Countdown;
use crate::error::TrackerError;
use crate::lifecycle::ItemState;

/// Opaque item identifier, assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

/// Storage category of a food item.
///
/// The wire form is a plain string. Unknown values are kept verbatim in
/// `Other` rather than rejected, so new categories need no server change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    None,
    /// Long shelf-life, shelf-stable dry goods.
    Lssd,
    /// General merchandise.
    Gm,
    /// Ready to eat.
    Rte,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::None => "None",
            Category::Lssd => "LSSD",
            Category::Gm => "GM",
            Category::Rte => "RTE",
            Category::Other(s) => s,
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "None" => Category::None,
            "LSSD" => Category::Lssd,
            "GM" => Category::Gm,
            "RTE" => Category::Rte,
            _ => Category::Other(s),
        }
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A tracked food item, active or in the trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: ItemId,
    pub name: String,
    pub expiry_date: DateTime<Utc>,
    pub category: Category,
    pub notes: Option<String>,
    pub is_deleted: bool,
    /// Set exactly while `is_deleted` is true.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FoodItem {
    /// Build a fresh active item from validated input.
    pub fn new(id: ItemId, input: NewFoodItem, created_at: DateTime<Utc>) -> Self {
        FoodItem {
            id,
            name: input.name,
            expiry_date: input.expiry_date,
            category: input.category,
            notes: input.notes,
            is_deleted: false,
            deleted_at: None,
            created_at,
        }
    }

    pub fn state(&self) -> ItemState {
        if self.is_deleted {
            ItemState::Deleted
        } else {
            ItemState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    pub fn countdown<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Countdown {
        Countdown::between(&self.expiry_date, now)
    }

    /// Apply field changes. Identity, creation time and trash state are untouched.
    pub fn apply(&mut self, changes: &ItemChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(expiry) = changes.expiry_date {
            self.expiry_date = expiry;
        }
        if let Some(category) = &changes.category {
            self.category = category.clone();
        }
        if let Some(notes) = &changes.notes {
            self.notes = notes.clone();
        }
    }

    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
    }

    pub fn mark_restored(&mut self) {
        self.is_deleted = false;
        self.deleted_at = None;
    }
}

/// Create request body as received on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItemDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFoodItem {
    pub name: String,
    pub expiry_date: DateTime<Utc>,
    pub category: Category,
    pub notes: Option<String>,
}

impl FoodItemDraft {
    pub fn new(name: impl Into<String>, expiry_date: DateTime<Utc>, category: Category) -> Self {
        FoodItemDraft {
            name: name.into(),
            expiry_date: expiry_date.to_rfc3339(),
            category: Some(category),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(self) -> Result<NewFoodItem, TrackerError> {
        check_name(&self.name)?;
        let expiry_date = parse_expiry(&self.expiry_date)?;
        let category = self
            .category
            .ok_or_else(|| TrackerError::validation("category is required"))?;
        Ok(NewFoodItem {
            name: self.name,
            expiry_date,
            category,
            notes: normalize_notes(self.notes),
        })
    }
}

/// Partial update body. Absent fields are left alone; `"notes": null` clears notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
}

/// A patch that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub category: Option<Category>,
    pub notes: Option<Option<String>>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.expiry_date.is_none()
            && self.category.is_none()
            && self.notes.is_none()
    }
}

impl FoodItemPatch {
    pub fn validate(self) -> Result<ItemChanges, TrackerError> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        let expiry_date = self.expiry_date.as_deref().map(parse_expiry).transpose()?;
        Ok(ItemChanges {
            name: self.name,
            expiry_date,
            category: self.category,
            notes: self.notes.map(normalize_notes),
        })
    }
}

/// `PATCH /food-items/:id` body: the patch plus an optional admin secret.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub patch: FoodItemPatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

/// `DELETE /food-items/:id` body. The body itself is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

/// Parse an expiry timestamp.
///
/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC), or a
/// bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, TrackerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TrackerError::validation("expiryDate is required"));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(TrackerError::validation(format!(
        "expiryDate is not a valid date: {raw}"
    )))
}

fn check_name(name: &str) -> Result<(), TrackerError> {
    if name.trim().is_empty() {
        return Err(TrackerError::validation("name must not be empty"));
    }
    Ok(())
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.is_empty())
}

// Distinguishes an explicit `null` (Some(None)) from an absent field (None).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
