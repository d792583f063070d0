//! Collaborators the room engine depends on.
//!
//! The engine never talks to a database or an auth backend directly. Every
//! persistence and lookup concern sits behind one of these traits so the
//! SQLite implementations and the in-memory ones in [`memory`] are
//! interchangeable.

pub mod memory;

use async_trait::async_trait;

use crate::entities::{
    AuditEntry, DocumentSnapshot, Handshake, Identity, Message, MessageDeletion, MessageEdit,
    NewMessage, NotificationPayload,
};
use crate::types::{MessageId, RoomAccess, RoomKey, StoreError, UserId};

/// Maps handshake credentials to an authenticated identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `None` means the handshake carries no usable identity.
    async fn resolve(&self, handshake: &Handshake) -> Option<Identity>;
}

/// Decides whether an identity may join a room, and with which privileges.
#[async_trait]
pub trait RoomAuthorizer: Send + Sync {
    async fn access(&self, identity: &Identity, room: &RoomKey) -> Result<RoomAccess, StoreError>;
}

/// Handle lookup used by mention dispatch.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError>;
}

/// Out-of-band, per-user delivery independent of room membership.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: UserId, payload: NotificationPayload) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), StoreError>;
}

/// Chat message persistence.
///
/// `update_body` and `soft_delete` are conditional writes: they return
/// `Ok(None)` when the stored record no longer satisfies the request's
/// preconditions.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, message: NewMessage) -> Result<Message, StoreError>;

    async fn get(&self, room: &RoomKey, id: MessageId) -> Result<Option<Message>, StoreError>;

    async fn update_body(&self, edit: MessageEdit) -> Result<Option<Message>, StoreError>;

    async fn soft_delete(&self, deletion: MessageDeletion) -> Result<Option<Message>, StoreError>;
}

/// Whole-content document persistence (last writer wins).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn replace_content(
        &self,
        document_id: i64,
        content: &str,
        editor: UserId,
    ) -> Result<DocumentSnapshot, StoreError>;

    async fn get(&self, document_id: i64) -> Result<Option<DocumentSnapshot>, StoreError>;
}
