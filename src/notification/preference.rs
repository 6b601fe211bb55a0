use async_trait::async_trait;
use sqlx::{query, query_scalar, Pool, Sqlite};

use crate::error::AppError;

/// Small key-value store for per-user boolean flags.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, AppError>;

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), AppError>;
}

pub fn motivational_key(user_id: &str) -> String {
    format!("motivational_messages_{}", user_id)
}

pub struct SqlitePreferenceStore {
    db: Pool<Sqlite>,
}

impl SqlitePreferenceStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        SqlitePreferenceStore { db }
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, AppError> {
        let value = query_scalar::<_, bool>("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(value)
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), AppError> {
        query(
            "INSERT INTO preferences (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
