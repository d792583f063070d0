//! In-memory collaborator implementations.
//!
//! Used by the engine's own tests and by the gateway tests, and handy for
//! running the server without a database. Stores can be told to fail so
//! persistence-failure paths are testable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Notify, RwLock};

use super::{
    AuditLog, DocumentStore, IdentityResolver, MessageStore, NotificationSink, RoomAuthorizer,
    UserDirectory,
};
use crate::entities::{
    AuditEntry, DocumentSnapshot, Handshake, Identity, Message, MessageDeletion, MessageEdit,
    MessageState, NewMessage, NotificationPayload,
};
use crate::types::{MessageId, RoomAccess, RoomKey, StoreError, UserId};

fn injected_failure() -> StoreError {
    StoreError::unavailable("injected failure")
}

/// Message store keyed by id
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: RwLock<HashMap<MessageId, Message>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`].
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Insert a record as-is, e.g. one created long ago.
    pub async fn insert(&self, message: Message) {
        self.next_id.fetch_max(message.id, Ordering::SeqCst);
        self.messages.write().await.insert(message.id, message);
    }

    pub async fn find(&self, id: MessageId) -> Option<Message> {
        self.messages.read().await.get(&id).cloned()
    }

    pub async fn in_room(&self, room: &RoomKey) -> Vec<Message> {
        let messages = self.messages.read().await;
        let mut found: Vec<Message> = messages
            .values()
            .filter(|message| &message.room == room)
            .cloned()
            .collect();
        found.sort_by_key(|message| message.id);
        found
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(injected_failure())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create(&self, message: NewMessage) -> Result<Message, StoreError> {
        self.check_writable()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = Message {
            id,
            room: message.room,
            sender_id: message.sender_id,
            body: message.body,
            state: MessageState::Sent,
            created_at: message.created_at,
            updated_at: message.created_at,
            deleted_by: None,
        };
        self.messages.write().await.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, room: &RoomKey, id: MessageId) -> Result<Option<Message>, StoreError> {
        let messages = self.messages.read().await;
        Ok(messages
            .get(&id)
            .filter(|message| &message.room == room)
            .cloned())
    }

    async fn update_body(&self, edit: MessageEdit) -> Result<Option<Message>, StoreError> {
        self.check_writable()?;
        let mut messages = self.messages.write().await;
        let Some(message) = messages.get_mut(&edit.id) else {
            return Ok(None);
        };
        let applies = message.room == edit.room
            && message.sender_id == edit.editor
            && !message.is_deleted()
            && message.created_at >= edit.not_before;
        if !applies {
            return Ok(None);
        }
        message.body = edit.body;
        message.state = MessageState::Edited;
        message.updated_at = edit.edited_at;
        Ok(Some(message.clone()))
    }

    async fn soft_delete(&self, deletion: MessageDeletion) -> Result<Option<Message>, StoreError> {
        self.check_writable()?;
        let mut messages = self.messages.write().await;
        let Some(message) = messages.get_mut(&deletion.id) else {
            return Ok(None);
        };
        let applies = message.room == deletion.room
            && !message.is_deleted()
            && (deletion.privileged || message.sender_id == deletion.actor);
        if !applies {
            return Ok(None);
        }
        message.body = deletion.tombstone;
        message.state = MessageState::Deleted;
        message.deleted_by = Some(deletion.actor);
        message.updated_at = deletion.deleted_at;
        Ok(Some(message.clone()))
    }
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<i64, DocumentSnapshot>>,
    failing: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Register a document so it can be edited.
    pub async fn seed(&self, document_id: i64, content: impl Into<String>) {
        self.documents.write().await.insert(
            document_id,
            DocumentSnapshot {
                document_id,
                content: content.into(),
                updated_by: None,
                updated_at: Utc::now(),
            },
        );
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn replace_content(
        &self,
        document_id: i64,
        content: &str,
        editor: UserId,
    ) -> Result<DocumentSnapshot, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(&document_id)
            .ok_or_else(|| StoreError::NotFound(format!("document {document_id}")))?;
        document.content = content.to_string();
        document.updated_by = Some(editor);
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    async fn get(&self, document_id: i64) -> Result<Option<DocumentSnapshot>, StoreError> {
        Ok(self.documents.read().await.get(&document_id).cloned())
    }
}

/// Users addressable by handle, plus the session tokens that resolve to them.
#[derive(Default, Clone)]
pub struct MemoryDirectory {
    users: HashMap<String, Identity>,
    tokens: HashMap<String, UserId>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, identity: Identity, token: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), identity.user_id);
        self.users.insert(identity.username.clone(), identity);
        self
    }
}

#[async_trait]
impl IdentityResolver for MemoryDirectory {
    async fn resolve(&self, handshake: &Handshake) -> Option<Identity> {
        let user_id = *self.tokens.get(handshake.token()?)?;
        self.users
            .values()
            .find(|identity| identity.user_id == user_id)
            .cloned()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.users.get(username).cloned())
    }
}

/// Explicit grant table; anything not granted is denied.
#[derive(Default)]
pub struct MemoryAuthorizer {
    grants: HashMap<(RoomKey, UserId), RoomAccess>,
    failing: AtomicBool,
}

impl MemoryAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, room: RoomKey, user_id: UserId, access: RoomAccess) -> Self {
        self.grants.insert((room, user_id), access);
        self
    }

    pub fn fail_lookups(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoomAuthorizer for MemoryAuthorizer {
    async fn access(&self, identity: &Identity, room: &RoomKey) -> Result<RoomAccess, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(self
            .grants
            .get(&(*room, identity.user_id))
            .copied()
            .unwrap_or(RoomAccess::Denied))
    }
}

/// Records every notification it is handed.
#[derive(Default)]
pub struct MemoryNotifications {
    delivered: RwLock<Vec<(UserId, NotificationPayload)>>,
    signal: Notify,
}

impl MemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn delivered(&self) -> Vec<(UserId, NotificationPayload)> {
        self.delivered.read().await.clone()
    }

    /// Wait until at least `count` notifications arrived or `timeout` passed.
    pub async fn wait_for(
        &self,
        count: usize,
        timeout: Duration,
    ) -> Vec<(UserId, NotificationPayload)> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.signal.notified();
            {
                let delivered = self.delivered.read().await;
                if delivered.len() >= count {
                    return delivered.clone();
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.delivered().await;
            }
        }
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifications {
    async fn notify(&self, user_id: UserId, payload: NotificationPayload) -> Result<(), StoreError> {
        self.delivered.write().await.push((user_id, payload));
        self.signal.notify_waiters();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
    failing: AtomicBool,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.entries.write().await.push(entry);
        Ok(())
    }
}
