//! User lookups for mention resolution.

use async_trait::async_trait;
use chrono::Utc;
use huddle_realtime::{Identity, StoreError, UserDirectory};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::types::errors::store_error;
use crate::types::timestamp;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, username: &str, color: Option<&str>) -> Result<Identity, StoreError> {
        let row = sqlx::query(
            "INSERT INTO users (username, display_name, color, created_at) VALUES (?, ?, ?, ?)
             RETURNING id, username, color",
        )
        .bind(username)
        .bind(username)
        .bind(color)
        .bind(timestamp(Utc::now()))
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        identity_from_row(&row)
    }

}

fn identity_from_row(row: &SqliteRow) -> Result<Identity, StoreError> {
    Ok(Identity {
        user_id: row.try_get("id").map_err(store_error)?,
        username: row.try_get("username").map_err(store_error)?,
        color: row.try_get("color").map_err(store_error)?,
    })
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query("SELECT id, username, color FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.as_ref().map(identity_from_row).transpose()
    }
}
