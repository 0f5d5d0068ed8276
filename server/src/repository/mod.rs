//! Storage for food items.
//!
//! Two interchangeable backends implement [`Repository`]: an in-memory map for
//! tests and throwaway instances, and a PostgreSQL table for everything else.
//! State-changing calls are conditional on the item's current state, so a
//! soft delete on an already-trashed item reports `false` just like an
//! unknown id.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use larder_common::item::{FoodItem, ItemChanges, ItemId, NewFoodItem};
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[cfg(test)]
pub(crate) mod contract;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("postgres: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("connection pool: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("connection pool setup: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),
}

/// Which half of the lifecycle to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    Active,
    Deleted,
}

impl ListFilter {
    fn is_deleted(self) -> bool {
        self == ListFilter::Deleted
    }
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Short backend name for health output.
    fn backend(&self) -> &'static str;

    /// Items matching `filter`, oldest first.
    async fn list(&self, filter: ListFilter) -> Result<Vec<FoodItem>, StorageError>;

    async fn get(&self, id: &ItemId) -> Result<Option<FoodItem>, StorageError>;

    /// Insert a new active item with a freshly generated id.
    async fn create(
        &self,
        input: NewFoodItem,
        created_at: DateTime<Utc>,
    ) -> Result<FoodItem, StorageError>;

    /// Apply field changes to an active item. `None` if absent or trashed.
    async fn update(
        &self,
        id: &ItemId,
        changes: &ItemChanges,
    ) -> Result<Option<FoodItem>, StorageError>;

    /// Move an active item to the trash.
    async fn soft_delete(&self, id: &ItemId, at: DateTime<Utc>) -> Result<bool, StorageError>;

    /// Bring a trashed item back.
    async fn restore(&self, id: &ItemId) -> Result<bool, StorageError>;

    /// Remove a trashed item for good.
    async fn purge(&self, id: &ItemId) -> Result<bool, StorageError>;

    /// Remove every trashed item. Returns how many went.
    async fn purge_all_deleted(&self) -> Result<u64, StorageError>;
}

/// Pick a backend: PostgreSQL when a database URL is configured, memory otherwise.
pub async fn connect(database_url: Option<&str>) -> Result<Arc<dyn Repository>, StorageError> {
    match database_url {
        Some(url) => {
            let repo = PostgresRepository::connect(url).await?;
            Ok(Arc::new(repo))
        }
        None => Ok(Arc::new(MemoryRepository::new())),
    }
}

pub(crate) fn new_id() -> ItemId {
    ItemId(uuid::Uuid::new_v4().to_string())
}
