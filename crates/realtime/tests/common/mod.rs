#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use huddle_config::RealtimeConfig;
use huddle_realtime::repositories::memory::{
    MemoryAuditLog, MemoryAuthorizer, MemoryDirectory, MemoryDocumentStore, MemoryMessageStore,
    MemoryNotifications,
};
use huddle_realtime::{
    Connection, Frame, Handshake, HtmlSanitizer, Hub, HubCollaborators, Identity, RoomAccess,
    RoomKey,
};
use serde_json::Value;
use tokio::sync::mpsc;

pub const ANA: i64 = 1;
pub const BO: i64 = 2;
pub const CY: i64 = 3;
pub const DEE: i64 = 4;

pub fn conversation() -> RoomKey {
    RoomKey::conversation(1)
}

pub fn event() -> RoomKey {
    RoomKey::event(1)
}

pub fn document() -> RoomKey {
    RoomKey::document(1)
}

/// Hub wired to in-memory collaborators.
///
/// ana and bo are members of conversation 1, cy moderates it. ana is also in
/// event 1's chat, ana and bo may edit document 1. dee belongs nowhere.
pub struct TestContext {
    pub hub: Hub,
    pub messages: Arc<MemoryMessageStore>,
    pub documents: Arc<MemoryDocumentStore>,
    pub notifications: Arc<MemoryNotifications>,
    pub audit: Arc<MemoryAuditLog>,
    pub authorizer: Arc<MemoryAuthorizer>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(RealtimeConfig::default()).await
    }

    pub async fn with_config(config: RealtimeConfig) -> Self {
        let directory = Arc::new(
            MemoryDirectory::new()
                .with_user(Identity::new(ANA, "ana").with_color("#e11d48"), "ana-token")
                .with_user(Identity::new(BO, "bo"), "bo-token")
                .with_user(Identity::new(CY, "cy"), "cy-token")
                .with_user(Identity::new(DEE, "dee"), "dee-token"),
        );
        let authorizer = Arc::new(
            MemoryAuthorizer::new()
                .grant(conversation(), ANA, RoomAccess::Member)
                .grant(conversation(), BO, RoomAccess::Member)
                .grant(conversation(), CY, RoomAccess::Moderator)
                .grant(event(), ANA, RoomAccess::Member)
                .grant(document(), ANA, RoomAccess::Member)
                .grant(document(), BO, RoomAccess::Member),
        );
        let messages = Arc::new(MemoryMessageStore::new());
        let documents = Arc::new(MemoryDocumentStore::new());
        documents.seed(1, "").await;
        let notifications = Arc::new(MemoryNotifications::new());
        let audit = Arc::new(MemoryAuditLog::new());

        let hub = Hub::new(
            HubCollaborators {
                identities: directory.clone(),
                authorizer: authorizer.clone(),
                directory,
                notifier: notifications.clone(),
                messages: messages.clone(),
                documents: documents.clone(),
                audit: audit.clone(),
                sanitizer: Arc::new(HtmlSanitizer),
            },
            &config,
        );

        Self {
            hub,
            messages,
            documents,
            notifications,
            audit,
            authorizer,
        }
    }

    pub async fn join(&self, token: &str, room: RoomKey) -> (Connection, mpsc::Receiver<Frame>) {
        self.hub
            .connect(&Handshake::with_token(token), room)
            .await
            .expect("connection should be admitted")
    }
}

pub fn frame(kind: &str, payload: Value) -> String {
    serde_json::json!({ "type": kind, "payload": payload }).to_string()
}

/// Next frame delivered to a connection, decoded.
pub async fn next_frame(outbound: &mut mpsc::Receiver<Frame>) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(2), outbound.recv())
        .await
        .expect("frame should arrive in time")
        .expect("outbound channel open");
    serde_json::from_str(&frame).expect("outbound frames are JSON")
}

/// Assert nothing is delivered for a short while.
pub async fn assert_silent(outbound: &mut mpsc::Receiver<Frame>) {
    let received = tokio::time::timeout(Duration::from_millis(150), outbound.recv()).await;
    assert!(received.is_err(), "unexpected frame: {:?}", received);
}
