use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use larder_common::item::{FoodItem, ItemChanges, ItemId, NewFoodItem};
use larder_common::lifecycle;

use super::{new_id, ListFilter, Repository, StorageError};

/// Process-lifetime store. Each call locks only the shard holding the item.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    items: DashMap<ItemId, FoodItem>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<FoodItem>, StorageError> {
        let mut items: Vec<FoodItem> = self
            .items
            .iter()
            .filter(|entry| entry.is_deleted == filter.is_deleted())
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get(&self, id: &ItemId) -> Result<Option<FoodItem>, StorageError> {
        Ok(self.items.get(id).map(|entry| entry.value().clone()))
    }

    async fn create(
        &self,
        input: NewFoodItem,
        created_at: DateTime<Utc>,
    ) -> Result<FoodItem, StorageError> {
        let item = FoodItem::new(new_id(), input, created_at);
        self.items.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn update(
        &self,
        id: &ItemId,
        changes: &ItemChanges,
    ) -> Result<Option<FoodItem>, StorageError> {
        let Some(mut entry) = self.items.get_mut(id) else {
            return Ok(None);
        };
        if entry.is_deleted {
            return Ok(None);
        }
        entry.apply(changes);
        Ok(Some(entry.clone()))
    }

    async fn soft_delete(&self, id: &ItemId, at: DateTime<Utc>) -> Result<bool, StorageError> {
        Ok(match self.items.get_mut(id) {
            Some(mut entry) => lifecycle::soft_delete(&mut entry, at).is_ok(),
            None => false,
        })
    }

    async fn restore(&self, id: &ItemId) -> Result<bool, StorageError> {
        Ok(match self.items.get_mut(id) {
            Some(mut entry) => lifecycle::restore(&mut entry).is_ok(),
            None => false,
        })
    }

    async fn purge(&self, id: &ItemId) -> Result<bool, StorageError> {
        Ok(self.items.remove_if(id, |_, item| item.is_deleted).is_some())
    }

    async fn purge_all_deleted(&self) -> Result<u64, StorageError> {
        let mut removed = 0u64;
        self.items.retain(|_, item| {
            if item.is_deleted {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}
