//! Lifecycle operations against a repository.
//!
//! Every mutation re-evaluates the lifecycle and gate rules here, whatever
//! the client already checked.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use larder_common::events::{ChangeEvent, ChangeKind};
use larder_common::gate::AuthorizationGate;
use larder_common::item::{FoodItem, FoodItemDraft, FoodItemPatch, ItemId};
use larder_common::lifecycle::{self, Transition};
use larder_common::TrackerError;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{storage, ApiError};
use crate::events::EventHub;
use crate::repository::{ListFilter, Repository};

/// Outcome of `POST /change-password`. Changing the secret at runtime is
/// not supported, so a correct current password still yields `success: false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordChange {
    Unsupported,
    WrongCurrentPassword,
}

pub struct FoodService {
    repo: Arc<dyn Repository>,
    gate: AuthorizationGate,
    events: EventHub,
    day_offset: FixedOffset,
    trash_retention_days: u64,
}

impl FoodService {
    pub fn new(
        repo: Arc<dyn Repository>,
        gate: AuthorizationGate,
        day_offset: FixedOffset,
        trash_retention_days: u64,
    ) -> Self {
        FoodService {
            repo,
            gate,
            events: EventHub::new(),
            day_offset,
            trash_retention_days,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.repo.backend()
    }

    pub fn admin_configured(&self) -> bool {
        self.gate.is_configured()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.day_offset)
    }

    pub async fn list_active(&self) -> Result<Vec<FoodItem>, ApiError> {
        self.repo
            .list(ListFilter::Active)
            .await
            .map_err(storage("Failed to fetch food items"))
    }

    pub async fn list_trash(&self) -> Result<Vec<FoodItem>, ApiError> {
        self.repo
            .list(ListFilter::Deleted)
            .await
            .map_err(storage("Failed to fetch deleted food items"))
    }

    pub async fn get(&self, id: &ItemId) -> Result<FoodItem, ApiError> {
        self.repo
            .get(id)
            .await
            .map_err(storage("Failed to fetch food item"))?
            .ok_or_else(|| TrackerError::not_found("Food item not found").into())
    }

    pub async fn create(
        &self,
        draft: FoodItemDraft,
        now: DateTime<Utc>,
    ) -> Result<FoodItem, ApiError> {
        let input = draft.validate()?;
        let item = self
            .repo
            .create(input, now)
            .await
            .map_err(storage("Failed to create food item"))?;
        info!(id = %item.id, name = %item.name, "created food item");
        self.events.publish(ChangeKind::Created, Some(&item.id));
        Ok(item)
    }

    /// Gate is evaluated against the stored expiry before the patch is looked at.
    ///
    /// `patch` stays raw JSON until then, so a malformed body on an unknown or
    /// gated item reports 404 or 403 rather than 400.
    pub async fn update(
        &self,
        id: &ItemId,
        patch: Value,
        admin_password: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FoodItem, ApiError> {
        let current = self
            .repo
            .get(id)
            .await
            .map_err(storage("Failed to update food item"))?;
        let current = lifecycle::check_transition(current.as_ref(), Transition::Update)?;
        self.gate
            .authorize(current, admin_password, &self.local(now))?;

        let patch: FoodItemPatch = serde_json::from_value(patch)
            .map_err(|e| TrackerError::validation(format!("Invalid input data: {e}")))?;
        let changes = patch.validate()?;
        let item = self
            .repo
            .update(id, &changes)
            .await
            .map_err(storage("Failed to update food item"))?
            .ok_or_else(|| Transition::Update.not_found())?;
        info!(id = %item.id, "updated food item");
        self.events.publish(ChangeKind::Updated, Some(&item.id));
        Ok(item)
    }

    pub async fn soft_delete(
        &self,
        id: &ItemId,
        admin_password: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let current = self
            .repo
            .get(id)
            .await
            .map_err(storage("Failed to delete food item"))?;
        let current = lifecycle::check_transition(current.as_ref(), Transition::SoftDelete)?;
        self.gate.authorize(current, admin_password, &self.local(now))?;

        let moved = self
            .repo
            .soft_delete(id, now)
            .await
            .map_err(storage("Failed to delete food item"))?;
        if !moved {
            return Err(Transition::SoftDelete.not_found().into());
        }
        info!(%id, "moved food item to trash");
        self.events.publish(ChangeKind::Deleted, Some(id));
        Ok(())
    }

    pub async fn restore(&self, id: &ItemId) -> Result<(), ApiError> {
        let restored = self
            .repo
            .restore(id)
            .await
            .map_err(storage("Failed to restore food item"))?;
        if !restored {
            return Err(Transition::Restore.not_found().into());
        }
        info!(%id, "restored food item");
        self.events.publish(ChangeKind::Restored, Some(id));
        Ok(())
    }

    pub async fn purge(&self, id: &ItemId) -> Result<(), ApiError> {
        let purged = self
            .repo
            .purge(id)
            .await
            .map_err(storage("Failed to permanently delete food item"))?;
        if !purged {
            return Err(Transition::Purge.not_found().into());
        }
        info!(%id, "permanently deleted food item");
        self.events.publish(ChangeKind::Purged, Some(id));
        Ok(())
    }

    pub async fn purge_all_deleted(&self) -> Result<u64, ApiError> {
        let removed = self
            .repo
            .purge_all_deleted()
            .await
            .map_err(storage("Failed to clear trash"))?;
        info!(removed, "cleared trash");
        self.events.publish(ChangeKind::TrashCleared, None);
        Ok(removed)
    }

    /// Purge trashed items whose retention window has run out.
    pub async fn purge_expired_trash(&self, now: DateTime<Utc>) -> Result<usize, ApiError> {
        let trash = self.list_trash().await?;
        let due = lifecycle::purge_candidates(&trash, &self.local(now), self.trash_retention_days);
        let mut purged = 0;
        for item in due {
            match self.repo.purge(&item.id).await {
                Ok(true) => {
                    purged += 1;
                    self.events.publish(ChangeKind::AutoPurged, Some(&item.id));
                }
                // Restored or purged by someone else in the meantime.
                Ok(false) => debug!(id = %item.id, "auto-purge skipped item"),
                Err(e) => warn!(id = %item.id, error = %e, "auto-purge failed"),
            }
        }
        if purged > 0 {
            info!(purged, "auto-purged expired trash");
        }
        Ok(purged)
    }

    pub fn verify_password(&self, candidate: &str) -> Result<bool, TrackerError> {
        self.gate.verify(candidate)
    }

    pub fn change_password(&self, current: &str) -> Result<PasswordChange, TrackerError> {
        if self.gate.verify(current)? {
            Ok(PasswordChange::Unsupported)
        } else {
            Ok(PasswordChange::WrongCurrentPassword)
        }
    }
}
