use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::models::{NewTrackedItem, TrackedItem, TrackedItemUpdate};

/// Keyed persistent record store for tracked items. The pipeline only
/// needs create / find / list / update-by-id semantics; everything else
/// about persistence is behind this seam.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Creates a new tracked item. Re-tracking an existing (url, email)
    /// pair is rejected with a conflict, not merged.
    async fn create(&self, new_item: NewTrackedItem) -> Result<TrackedItem>;

    /// All items for a subscriber, newest-checked first.
    async fn find_by_email(&self, email: &str) -> Result<Vec<TrackedItem>>;

    /// All items still eligible for scanning (alert_sent = false).
    async fn find_pending(&self) -> Result<Vec<TrackedItem>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<TrackedItem>>;

    /// Applies the set fields of `update` as a single statement.
    async fn update_by_id(&self, id: &str, update: TrackedItemUpdate) -> Result<()>;
}

pub struct SqliteTrackerStore {
    pool: SqlitePool,
}

impl SqliteTrackerStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout))
            .connect(&config.url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tracked_items (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                email TEXT NOT NULL,
                price REAL NOT NULL,
                alert_sent BOOLEAN NOT NULL DEFAULT 0,
                last_checked TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (url, email)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TrackerStore for SqliteTrackerStore {
    async fn create(&self, new_item: NewTrackedItem) -> Result<TrackedItem> {
        let item = TrackedItem::new(new_item);

        let result = sqlx::query(
            r#"
            INSERT INTO tracked_items (id, url, email, price, alert_sent, last_checked, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.url)
        .bind(&item.email)
        .bind(item.price)
        .bind(item.alert_sent)
        .bind(item.last_checked)
        .bind(item.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(item),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::Conflict(
                    "You are already tracking this product".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<TrackedItem>> {
        let items = sqlx::query_as::<_, TrackedItem>(
            r#"
            SELECT id, url, email, price, alert_sent, last_checked, created_at
            FROM tracked_items
            WHERE email = ?
            ORDER BY last_checked DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn find_pending(&self) -> Result<Vec<TrackedItem>> {
        let items = sqlx::query_as::<_, TrackedItem>(
            r#"
            SELECT id, url, email, price, alert_sent, last_checked, created_at
            FROM tracked_items
            WHERE alert_sent = 0
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TrackedItem>> {
        let item = sqlx::query_as::<_, TrackedItem>(
            r#"
            SELECT id, url, email, price, alert_sent, last_checked, created_at
            FROM tracked_items
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn update_by_id(&self, id: &str, update: TrackedItemUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let result = sqlx::query(
            r#"
            UPDATE tracked_items
            SET price = COALESCE(?, price),
                alert_sent = COALESCE(?, alert_sent),
                last_checked = COALESCE(?, last_checked)
            WHERE id = ?
            "#,
        )
        .bind(update.price)
        .bind(update.alert_sent)
        .bind(update.last_checked)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound {
                resource: format!("tracked item {}", id),
            });
        }
        Ok(())
    }
}
