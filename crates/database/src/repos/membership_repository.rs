//! Room authorization backed by the participant tables.
//!
//! A user may enter a room when they are listed as a member or own it.
//! Owners and admins moderate; admins still need to be members to enter.

use async_trait::async_trait;
use huddle_realtime::{Identity, RoomAccess, RoomAuthorizer, RoomKey, RoomKind, StoreError};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::types::errors::store_error;

const CONVERSATION_ACCESS: &str = "SELECT
    EXISTS(SELECT 1 FROM conversation_participants WHERE conversation_id = ? AND user_id = ?) AS is_member,
    EXISTS(SELECT 1 FROM conversations WHERE id = ? AND owner_id = ?) AS is_owner,
    EXISTS(SELECT 1 FROM users WHERE id = ? AND is_admin = 1) AS is_admin";

const EVENT_ACCESS: &str = "SELECT
    EXISTS(SELECT 1 FROM event_members WHERE event_id = ? AND user_id = ?) AS is_member,
    EXISTS(SELECT 1 FROM events WHERE id = ? AND organiser_id = ?) AS is_owner,
    EXISTS(SELECT 1 FROM users WHERE id = ? AND is_admin = 1) AS is_admin";

const DOCUMENT_ACCESS: &str = "SELECT
    EXISTS(SELECT 1 FROM document_editors WHERE document_id = ? AND user_id = ?) AS is_member,
    EXISTS(SELECT 1 FROM documents WHERE id = ? AND owner_id = ?) AS is_owner,
    EXISTS(SELECT 1 FROM users WHERE id = ? AND is_admin = 1) AS is_admin";

#[derive(Clone)]
pub struct MembershipRepository {
    pool: SqlitePool,
}

impl MembershipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomAuthorizer for MembershipRepository {
    async fn access(&self, identity: &Identity, room: &RoomKey) -> Result<RoomAccess, StoreError> {
        let query = match room.kind {
            RoomKind::Conversation => CONVERSATION_ACCESS,
            RoomKind::Event => EVENT_ACCESS,
            RoomKind::Document => DOCUMENT_ACCESS,
        };

        let row = sqlx::query(query)
            .bind(room.id)
            .bind(identity.user_id)
            .bind(room.id)
            .bind(identity.user_id)
            .bind(identity.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        let flag = |column: &str| -> Result<bool, StoreError> {
            row.try_get::<i64, _>(column)
                .map(|value| value != 0)
                .map_err(store_error)
        };
        let is_member = flag("is_member")?;
        let is_owner = flag("is_owner")?;
        let is_admin = flag("is_admin")?;

        let access = if !(is_member || is_owner) {
            RoomAccess::Denied
        } else if is_owner || is_admin {
            RoomAccess::Moderator
        } else {
            RoomAccess::Member
        };
        debug!(%room, user_id = identity.user_id, ?access, "room access resolved");
        Ok(access)
    }
}
