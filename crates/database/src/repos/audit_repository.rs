//! Append-only audit trail.

use async_trait::async_trait;
use chrono::Utc;
use huddle_realtime::{AuditEntry, AuditLog, StoreError};
use sqlx::SqlitePool;
use tracing::info;

use crate::types::errors::store_error;
use crate::types::timestamp;

#[derive(Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for AuditRepository {
    async fn record(&self, entry: AuditEntry) -> Result<(), StoreError> {
        let details = serde_json::to_string(&entry.details).map_err(StoreError::backend)?;
        sqlx::query("INSERT INTO audit_log (actor_id, action, details, created_at) VALUES (?, ?, ?, ?)")
            .bind(entry.actor)
            .bind(&entry.action)
            .bind(&details)
            .bind(timestamp(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        info!(actor = entry.actor, action = %entry.action, "audit entry recorded");
        Ok(())
    }
}
