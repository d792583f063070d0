//! Whole-content document persistence.

use async_trait::async_trait;
use chrono::Utc;
use huddle_realtime::{DocumentSnapshot, DocumentStore, StoreError, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::types::errors::store_error;
use crate::types::{parse_timestamp, timestamp};

#[derive(Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn snapshot_from_row(row: &SqliteRow) -> Result<DocumentSnapshot, StoreError> {
    let updated_at: String = row.try_get("updated_at").map_err(store_error)?;
    Ok(DocumentSnapshot {
        document_id: row.try_get("id").map_err(store_error)?,
        content: row.try_get("content").map_err(store_error)?,
        updated_by: row.try_get("updated_by").map_err(store_error)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait]
impl DocumentStore for DocumentRepository {
    async fn replace_content(
        &self,
        document_id: i64,
        content: &str,
        editor: UserId,
    ) -> Result<DocumentSnapshot, StoreError> {
        let row = sqlx::query(
            "UPDATE documents SET content = ?, updated_by = ?, updated_at = ?
             WHERE id = ?
             RETURNING id, content, updated_by, updated_at",
        )
        .bind(content)
        .bind(editor)
        .bind(timestamp(Utc::now()))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => snapshot_from_row(&row),
            None => Err(StoreError::NotFound(format!("document {document_id}"))),
        }
    }

    async fn get(&self, document_id: i64) -> Result<Option<DocumentSnapshot>, StoreError> {
        let row = sqlx::query("SELECT id, content, updated_by, updated_at FROM documents WHERE id = ?")
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.as_ref().map(snapshot_from_row).transpose()
    }
}
