//! Entry point tying admission, membership and frame handling together.
//!
//! A transport calls [`Hub::connect`] once per incoming connection and then
//! feeds it inbound text with [`Connection::process`] while forwarding the
//! returned receiver's frames to the peer.

use std::sync::Arc;

use huddle_config::RealtimeConfig;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use crate::entities::{Handshake, Identity};
use crate::repositories::{
    AuditLog, DocumentStore, IdentityResolver, MessageStore, NotificationSink, RoomAuthorizer,
    UserDirectory,
};
use crate::types::{
    ConnectionId, Frame, InboundFrame, RealtimeResult, Rejection, RoomKey, RoomKind,
};
use crate::utils::TextSanitizer;

use super::{
    ChatRoom, ConnectionHandle, DocumentRoom, DocumentService, Gatekeeper, MentionService,
    MessageService, RoomContext, RoomHandler, RoomMembership, RoomRegistry, Session,
};

/// Everything the engine delegates to the outside world.
#[derive(Clone)]
pub struct HubCollaborators {
    pub identities: Arc<dyn IdentityResolver>,
    pub authorizer: Arc<dyn RoomAuthorizer>,
    pub directory: Arc<dyn UserDirectory>,
    pub notifier: Arc<dyn NotificationSink>,
    pub messages: Arc<dyn MessageStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub audit: Arc<dyn AuditLog>,
    pub sanitizer: Arc<dyn TextSanitizer>,
}

#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    registry: RoomRegistry,
    gatekeeper: Gatekeeper,
    identities: Arc<dyn IdentityResolver>,
    chat: Arc<dyn RoomHandler>,
    documents: Arc<dyn RoomHandler>,
    outbound_buffer: usize,
}

impl Hub {
    pub fn new(collaborators: HubCollaborators, config: &RealtimeConfig) -> Self {
        let HubCollaborators {
            identities,
            authorizer,
            directory,
            notifier,
            messages,
            documents,
            audit,
            sanitizer,
        } = collaborators;

        let messages = MessageService::new(
            messages,
            audit,
            Arc::clone(&sanitizer),
            config.edit_window(),
        );
        let mentions = Arc::new(MentionService::new(
            directory,
            notifier,
            config.public_url.clone(),
        ));
        let documents = DocumentService::new(documents, sanitizer);

        Self {
            inner: Arc::new(HubInner {
                registry: RoomRegistry::new(config.send_timeout()),
                gatekeeper: Gatekeeper::new(authorizer),
                identities,
                chat: Arc::new(ChatRoom::new(messages, mentions)),
                documents: Arc::new(DocumentRoom::new(documents)),
                outbound_buffer: config.outbound_buffer,
            }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    /// Resolve the handshake's identity without joining any room.
    pub async fn identify(&self, handshake: &Handshake) -> Option<Identity> {
        self.inner.identities.resolve(handshake).await
    }

    /// Admit a connection into `room`.
    ///
    /// On success the connection is already a room member and the receiver
    /// yields every frame broadcast to it.
    pub async fn connect(
        &self,
        handshake: &Handshake,
        room: RoomKey,
    ) -> Result<(Connection, mpsc::Receiver<Frame>), Rejection> {
        let identity = self.identify(handshake).await;
        let session = Arc::new(self.inner.gatekeeper.admit(identity, room).await?);

        let (handle, outbound) =
            ConnectionHandle::new(session.user_id(), self.inner.outbound_buffer);
        let id = handle.id();
        let eviction = handle.eviction();
        let membership = self.inner.registry.join(room, handle);

        info!(%room, connection = %id, user_id = session.user_id(), access = ?session.access, "connection admitted");

        let connection = Connection {
            context: RoomContext::new(session, id, self.inner.registry.clone()),
            handler: self.handler_for(room.kind),
            eviction,
            membership,
        };
        Ok((connection, outbound))
    }

    fn handler_for(&self, kind: RoomKind) -> Arc<dyn RoomHandler> {
        match kind {
            RoomKind::Conversation | RoomKind::Event => Arc::clone(&self.inner.chat),
            RoomKind::Document => Arc::clone(&self.inner.documents),
        }
    }
}

/// An admitted connection. Dropping it removes it from its room.
pub struct Connection {
    context: RoomContext,
    handler: Arc<dyn RoomHandler>,
    eviction: Arc<Notify>,
    membership: RoomMembership,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.context.connection
    }

    pub fn session(&self) -> &Session {
        &self.context.session
    }

    pub fn room(&self) -> RoomKey {
        self.membership.room()
    }

    /// Parse and apply one inbound frame.
    pub async fn handle_text(&self, text: &str) -> RealtimeResult<()> {
        let frame = InboundFrame::parse(text)?;
        debug!(room = %self.room(), connection = %self.id(), frame = frame.name(), "inbound frame");
        self.handler.handle(&self.context, frame).await
    }

    /// Like [`handle_text`](Self::handle_text), but logs failures instead of
    /// returning them. A bad frame never closes the connection.
    pub async fn process(&self, text: &str) {
        if let Err(err) = self.handle_text(text).await {
            if err.is_client_error() {
                warn!(room = %self.room(), connection = %self.id(), error = %err, "dropping frame");
            } else {
                error!(room = %self.room(), connection = %self.id(), error = %err, "frame handling failed");
            }
        }
    }

    /// Resolves once the registry gave up on delivering to this connection.
    pub async fn evicted(&self) {
        self.eviction.notified().await
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        info!(room = %self.room(), connection = %self.id(), user_id = self.session().user_id(), "connection closed");
    }
}
