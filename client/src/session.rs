//! Local view of the tracker: cached lists plus the client-side rules that
//! run before any mutation is sent.
//!
//! The server re-checks everything; the checks here only save a round trip
//! and let the caller ask for a secret before it is needed.

use chrono::{DateTime, TimeZone};
use futures::future::join_all;
use larder_common::events::{ChangeEvent, Collection};
use larder_common::gate::GateRequirement;
use larder_common::item::{parse_expiry, FoodItemDraft, FoodItemPatch};
use larder_common::lifecycle::{check_transition, sweep_candidates, Transition};
use larder_common::validation::check_draft;
use larder_common::{FoodItem, ItemId, TrackerError};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::ClientError;

pub const MSG_PASSWORD_NEEDED: &str =
    "Admin password required to change items more than 15 days from expiry";

pub struct Session {
    api: ApiClient,
    admin_password: Option<String>,
    active: Vec<FoodItem>,
    trash: Vec<FoodItem>,
}

impl Session {
    pub fn new(api: ApiClient, admin_password: Option<String>) -> Self {
        Session {
            api,
            admin_password: admin_password.filter(|p| !p.is_empty()),
            active: Vec::new(),
            trash: Vec::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn active(&self) -> &[FoodItem] {
        &self.active
    }

    pub fn trash(&self) -> &[FoodItem] {
        &self.trash
    }

    /// Re-fetch both lists.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let (active, trash) = tokio::try_join!(self.api.list_active(), self.api.list_trash())?;
        self.active = active;
        self.trash = trash;
        Ok(())
    }

    /// Re-fetch only what `event` touched.
    pub async fn refresh_affected(&mut self, event: &ChangeEvent) -> Result<(), ClientError> {
        for collection in event.affected() {
            match collection {
                Collection::Active => self.active = self.api.list_active().await?,
                Collection::Trash => self.trash = self.api.list_trash().await?,
            }
        }
        Ok(())
    }

    async fn lookup(&self, id: &ItemId, transition: Transition) -> Result<FoodItem, ClientError> {
        let cached = self
            .active
            .iter()
            .chain(self.trash.iter())
            .find(|item| &item.id == id)
            .cloned();
        let item = match cached {
            Some(item) => item,
            None => self.api.get(id).await?,
        };
        check_transition(Some(&item), transition)?;
        Ok(item)
    }

    /// Look up `id` for `transition` and pick the secret to send with it.
    async fn prepare<Tz: TimeZone>(
        &self,
        id: &ItemId,
        transition: Transition,
        now: &DateTime<Tz>,
    ) -> Result<(FoodItem, Option<String>), ClientError> {
        let item = self.lookup(id, transition).await?;
        let secret = if transition.is_gated() {
            self.credentials_for(&item, now)?.map(str::to_string)
        } else {
            None
        };
        Ok((item, secret))
    }

    /// The secret to send for a gated mutation on `item`, if any.
    fn credentials_for<Tz: TimeZone>(
        &self,
        item: &FoodItem,
        now: &DateTime<Tz>,
    ) -> Result<Option<&str>, ClientError> {
        match GateRequirement::for_item(item, now) {
            GateRequirement::Open => Ok(None),
            GateRequirement::SecretRequired => match self.admin_password.as_deref() {
                Some(secret) => Ok(Some(secret)),
                None => Err(TrackerError::Authorization(MSG_PASSWORD_NEEDED.to_string()).into()),
            },
        }
    }

    /// Whether changing `item` at `now` needs the admin secret.
    pub fn needs_password<Tz: TimeZone>(&self, item: &FoodItem, now: &DateTime<Tz>) -> bool {
        GateRequirement::for_item(item, now).is_required()
    }

    pub async fn add<Tz: TimeZone>(
        &mut self,
        draft: FoodItemDraft,
        now: &DateTime<Tz>,
    ) -> Result<FoodItem, ClientError> {
        let expiry = parse_expiry(&draft.expiry_date)?;
        let problems = check_draft(&draft.name, &expiry, &self.active, None, now);
        if !problems.is_empty() {
            return Err(ClientError::Draft(problems));
        }
        let item = self.api.create(&draft).await?;
        info!(id = %item.id, name = %item.name, "item added");
        self.active.push(item.clone());
        Ok(item)
    }

    pub async fn edit<Tz: TimeZone>(
        &mut self,
        id: &ItemId,
        patch: FoodItemPatch,
        now: &DateTime<Tz>,
    ) -> Result<FoodItem, ClientError> {
        let (current, secret) = self.prepare(id, Transition::Update, now).await?;

        if patch.name.is_some() || patch.expiry_date.is_some() {
            let name = patch.name.as_deref().unwrap_or(&current.name);
            let expiry = match patch.expiry_date.as_deref() {
                Some(raw) => parse_expiry(raw)?,
                None => current.expiry_date,
            };
            let problems = check_draft(name, &expiry, &self.active, Some(id), now);
            if !problems.is_empty() {
                return Err(ClientError::Draft(problems));
            }
        }

        let updated = self.api.update(id, patch, secret.as_deref()).await?;
        if let Some(slot) = self.active.iter_mut().find(|item| &item.id == id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    pub async fn delete<Tz: TimeZone>(
        &mut self,
        id: &ItemId,
        now: &DateTime<Tz>,
    ) -> Result<(), ClientError> {
        let (_, secret) = self.prepare(id, Transition::SoftDelete, now).await?;
        self.api.soft_delete(id, secret.as_deref()).await?;
        self.refresh().await
    }

    pub async fn restore(&mut self, id: &ItemId) -> Result<(), ClientError> {
        self.lookup(id, Transition::Restore).await?;
        self.api.restore(id).await?;
        self.refresh().await
    }

    pub async fn purge(&mut self, id: &ItemId) -> Result<(), ClientError> {
        self.lookup(id, Transition::Purge).await?;
        self.api.purge(id).await?;
        self.trash.retain(|item| &item.id != id);
        Ok(())
    }

    pub async fn clear_trash(&mut self) -> Result<(), ClientError> {
        self.api.clear_trash().await?;
        self.trash.clear();
        Ok(())
    }

    /// Move every item at least a day past expiry to the trash.
    ///
    /// Expired items never need the secret, so none is sent. A delete that
    /// loses a race with another session comes back 404 and is skipped.
    /// Returns the names of the items this call moved.
    pub async fn auto_expire_sweep<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<String> {
        let candidates: Vec<(ItemId, String)> = sweep_candidates(&self.active, now)
            .into_iter()
            .map(|item| (item.id.clone(), item.name.clone()))
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let api = &self.api;
        let results = join_all(candidates.iter().map(|(id, _)| api.soft_delete(id, None))).await;

        let mut moved = Vec::new();
        for ((id, name), result) in candidates.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    info!(%id, %name, "expired item moved to trash");
                    moved.push(name);
                }
                Err(e) if e.is_not_found() => {
                    debug!(%id, "expired item already gone; skipping");
                }
                Err(e) => warn!(%id, error = %e, "auto-expire delete failed"),
            }
        }

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "refresh after auto-expire sweep failed");
        }
        moved
    }
}
