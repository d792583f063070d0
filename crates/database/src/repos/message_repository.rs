//! Chat message persistence with conditional edit and soft delete.

use async_trait::async_trait;
use huddle_realtime::{
    Message, MessageDeletion, MessageEdit, MessageId, MessageState, MessageStore, NewMessage,
    RoomKey, RoomKind, StoreError,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::types::errors::store_error;
use crate::types::{parse_timestamp, timestamp};

const MESSAGE_COLUMNS: &str =
    "id, room_kind, room_id, sender_id, body, state, deleted_by, created_at, updated_at";

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn message_from_row(row: &SqliteRow) -> Result<Message, StoreError> {
    let kind: String = row.try_get("room_kind").map_err(store_error)?;
    let state: String = row.try_get("state").map_err(store_error)?;
    let created_at: String = row.try_get("created_at").map_err(store_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(store_error)?;

    Ok(Message {
        id: row.try_get("id").map_err(store_error)?,
        room: RoomKey::new(
            kind.parse::<RoomKind>().map_err(StoreError::corrupt)?,
            row.try_get("room_id").map_err(store_error)?,
        ),
        sender_id: row.try_get("sender_id").map_err(store_error)?,
        body: row.try_get("body").map_err(store_error)?,
        state: state.parse::<MessageState>().map_err(StoreError::corrupt)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        deleted_by: row.try_get("deleted_by").map_err(store_error)?,
    })
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn create(&self, message: NewMessage) -> Result<Message, StoreError> {
        let created_at = timestamp(message.created_at);
        let row = sqlx::query(&format!(
            "INSERT INTO messages (room_kind, room_id, sender_id, body, state, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'sent', ?, ?)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.room.kind.as_str())
        .bind(message.room.id)
        .bind(message.sender_id)
        .bind(&message.body)
        .bind(&created_at)
        .bind(&created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        message_from_row(&row)
    }

    async fn get(&self, room: &RoomKey, id: MessageId) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ? AND room_kind = ? AND room_id = ?"
        ))
        .bind(id)
        .bind(room.kind.as_str())
        .bind(room.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn update_body(&self, edit: MessageEdit) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE messages SET body = ?, state = 'edited', updated_at = ?
             WHERE id = ? AND room_kind = ? AND room_id = ?
               AND sender_id = ? AND state != 'deleted' AND created_at >= ?
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(&edit.body)
        .bind(timestamp(edit.edited_at))
        .bind(edit.id)
        .bind(edit.room.kind.as_str())
        .bind(edit.room.id)
        .bind(edit.editor)
        .bind(timestamp(edit.not_before))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn soft_delete(&self, deletion: MessageDeletion) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE messages SET body = ?, state = 'deleted', deleted_by = ?, updated_at = ?
             WHERE id = ? AND room_kind = ? AND room_id = ?
               AND state != 'deleted' AND (? OR sender_id = ?)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(&deletion.tombstone)
        .bind(deletion.actor)
        .bind(timestamp(deletion.deleted_at))
        .bind(deletion.id)
        .bind(deletion.room.kind.as_str())
        .bind(deletion.room.id)
        .bind(deletion.privileged)
        .bind(deletion.actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(message_from_row).transpose()
    }
}
