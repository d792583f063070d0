//! Durable notification storage.

use async_trait::async_trait;
use chrono::Utc;
use huddle_realtime::{NotificationPayload, NotificationSink, StoreError, UserId};
use sqlx::SqlitePool;

use crate::types::errors::store_error;
use crate::types::timestamp;

#[derive(Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for NotificationRepository {
    async fn notify(&self, user_id: UserId, payload: NotificationPayload) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO notifications (user_id, message, url, created_at) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(&payload.message)
            .bind(&payload.url)
            .bind(timestamp(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
