use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, Pool, Runtime};
use larder_common::item::{Category, FoodItem, ItemChanges, ItemId, NewFoodItem};
use tokio_postgres::{NoTls, Row};
use tracing::info;

use super::{new_id, ListFilter, Repository, StorageError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS food_items (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    expiry_date TIMESTAMPTZ NOT NULL,
    category    TEXT NOT NULL,
    notes       TEXT,
    is_deleted  BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at  TIMESTAMPTZ,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT deleted_at_matches_flag CHECK (is_deleted = (deleted_at IS NOT NULL))
)";

const COLUMNS: &str = "id, name, expiry_date, category, notes, is_deleted, deleted_at, created_at";

/// `food_items` table behind a connection pool.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: Pool,
}

impl PostgresRepository {
    /// Build a pool for `url` and make sure the table exists.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let mut cfg = Config::new();
        cfg.url = Some(url.to_string());
        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        let repo = PostgresRepository { pool };
        repo.migrate().await?;
        info!("PostgreSQL repository ready");
        Ok(repo)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }

    /// Drop every row. Used by the contract tests to start from a clean table.
    #[cfg(all(test, feature = "postgres-tests"))]
    pub(crate) async fn truncate(&self) -> Result<(), StorageError> {
        let client = self.pool.get().await?;
        client.batch_execute("TRUNCATE food_items").await?;
        Ok(())
    }
}

fn row_to_item(row: &Row) -> Result<FoodItem, StorageError> {
    let category: String = row.try_get("category")?;
    Ok(FoodItem {
        id: ItemId(row.try_get("id")?),
        name: row.try_get("name")?,
        expiry_date: row.try_get("expiry_date")?,
        category: Category::from(category),
        notes: row.try_get("notes")?,
        is_deleted: row.try_get("is_deleted")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl Repository for PostgresRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<FoodItem>, StorageError> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {COLUMNS} FROM food_items WHERE is_deleted = $1 ORDER BY created_at, id"
        );
        let rows = client.query(sql.as_str(), &[&filter.is_deleted()]).await?;
        rows.iter().map(row_to_item).collect()
    }

    async fn get(&self, id: &ItemId) -> Result<Option<FoodItem>, StorageError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {COLUMNS} FROM food_items WHERE id = $1");
        let row = client.query_opt(sql.as_str(), &[&id.0]).await?;
        row.as_ref().map(row_to_item).transpose()
    }

    async fn create(
        &self,
        input: NewFoodItem,
        created_at: DateTime<Utc>,
    ) -> Result<FoodItem, StorageError> {
        let client = self.pool.get().await?;
        let id = new_id();
        let sql = format!(
            "INSERT INTO food_items (id, name, expiry_date, category, notes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        );
        let row = client
            .query_one(
                sql.as_str(),
                &[
                    &id.0,
                    &input.name,
                    &input.expiry_date,
                    &input.category.as_str(),
                    &input.notes,
                    &created_at,
                ],
            )
            .await?;
        row_to_item(&row)
    }

    async fn update(
        &self,
        id: &ItemId,
        changes: &ItemChanges,
    ) -> Result<Option<FoodItem>, StorageError> {
        let client = self.pool.get().await?;
        let sql = format!(
            "UPDATE food_items SET \
                name = COALESCE($2, name), \
                expiry_date = COALESCE($3, expiry_date), \
                category = COALESCE($4, category), \
                notes = CASE WHEN $5 THEN $6 ELSE notes END \
             WHERE id = $1 AND NOT is_deleted RETURNING {COLUMNS}"
        );
        let category = changes.category.as_ref().map(Category::as_str);
        let notes_set = changes.notes.is_some();
        let notes = changes.notes.clone().flatten();
        let row = client
            .query_opt(
                sql.as_str(),
                &[
                    &id.0,
                    &changes.name,
                    &changes.expiry_date,
                    &category,
                    &notes_set,
                    &notes,
                ],
            )
            .await?;
        row.as_ref().map(row_to_item).transpose()
    }

    async fn soft_delete(&self, id: &ItemId, at: DateTime<Utc>) -> Result<bool, StorageError> {
        let client = self.pool.get().await?;
        let n = client
            .execute(
                "UPDATE food_items SET is_deleted = TRUE, deleted_at = $2 \
                 WHERE id = $1 AND NOT is_deleted",
                &[&id.0, &at],
            )
            .await?;
        Ok(n > 0)
    }

    async fn restore(&self, id: &ItemId) -> Result<bool, StorageError> {
        let client = self.pool.get().await?;
        let n = client
            .execute(
                "UPDATE food_items SET is_deleted = FALSE, deleted_at = NULL \
                 WHERE id = $1 AND is_deleted",
                &[&id.0],
            )
            .await?;
        Ok(n > 0)
    }

    async fn purge(&self, id: &ItemId) -> Result<bool, StorageError> {
        let client = self.pool.get().await?;
        let n = client
            .execute(
                "DELETE FROM food_items WHERE id = $1 AND is_deleted",
                &[&id.0],
            )
            .await?;
        Ok(n > 0)
    }

    async fn purge_all_deleted(&self) -> Result<u64, StorageError> {
        let client = self.pool.get().await?;
        let n = client
            .execute("DELETE FROM food_items WHERE is_deleted", &[])
            .await?;
        Ok(n)
    }
}
