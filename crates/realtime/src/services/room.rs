//! Per-room-type frame handling.
//!
//! Connection lifecycle is shared; only what a frame does differs between
//! chat rooms and documents. Each room type plugs in a [`RoomHandler`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::types::{
    ConnectionId, InboundFrame, MessageSoftDeleted, MessageUpdated, Outcome, OutboundFrame,
    RealtimeError, RealtimeResult, RoomKey,
};

use super::{DocumentService, MentionService, MessageService, RoomRegistry, Session};

/// What a handler needs to know about the connection a frame came from.
#[derive(Clone)]
pub struct RoomContext {
    pub session: Arc<Session>,
    pub connection: ConnectionId,
    registry: RoomRegistry,
}

impl RoomContext {
    pub fn new(session: Arc<Session>, connection: ConnectionId, registry: RoomRegistry) -> Self {
        Self {
            session,
            connection,
            registry,
        }
    }

    pub fn room(&self) -> RoomKey {
        self.session.room
    }

    /// Encode once and send to the whole room, including this connection.
    pub async fn broadcast(&self, frame: &OutboundFrame) -> RealtimeResult<usize> {
        let encoded = frame.encode().map_err(RealtimeError::Encode)?;
        Ok(self.registry.broadcast(&self.session.room, encoded).await)
    }

    /// Encode once and send to everyone in the room but this connection.
    pub async fn broadcast_to_others(&self, frame: &OutboundFrame) -> RealtimeResult<usize> {
        let encoded = frame.encode().map_err(RealtimeError::Encode)?;
        Ok(self
            .registry
            .broadcast_except(&self.session.room, encoded, self.connection)
            .await)
    }
}

#[async_trait]
pub trait RoomHandler: Send + Sync {
    async fn handle(&self, ctx: &RoomContext, frame: InboundFrame) -> RealtimeResult<()>;
}

fn unsupported(ctx: &RoomContext, frame: &InboundFrame) -> RealtimeError {
    RealtimeError::UnsupportedFrame {
        frame: frame.name(),
        room: ctx.room().kind,
    }
}

/// Conversations and event chats.
pub struct ChatRoom {
    messages: MessageService,
    mentions: Arc<MentionService>,
}

impl ChatRoom {
    pub fn new(messages: MessageService, mentions: Arc<MentionService>) -> Self {
        Self { messages, mentions }
    }
}

#[async_trait]
impl RoomHandler for ChatRoom {
    async fn handle(&self, ctx: &RoomContext, frame: InboundFrame) -> RealtimeResult<()> {
        let session = &ctx.session;
        match frame {
            InboundFrame::NewMessage { text } => {
                let view = self.messages.create(session, &text).await?;
                let stored_text = view.text.clone();
                ctx.broadcast(&OutboundFrame::NewMessage(view)).await?;
                self.mentions
                    .spawn(session.identity.clone(), session.room, stored_text);
            }
            InboundFrame::UpdateMessage { id, text } => {
                match self.messages.update(session, id, &text).await? {
                    Outcome::Applied(message) => {
                        ctx.broadcast(&OutboundFrame::MessageUpdated(MessageUpdated {
                            id: message.id,
                            text: message.body,
                        }))
                        .await?;
                    }
                    Outcome::Skipped(reason) => {
                        warn!(room = %session.room, message_id = id, user_id = session.user_id(), %reason, "edit ignored");
                    }
                }
            }
            InboundFrame::DeleteMessage { id } => match self.messages.delete(session, id).await? {
                Outcome::Applied(message) => {
                    ctx.broadcast(&OutboundFrame::MessageSoftDeleted(MessageSoftDeleted {
                        id: message.id,
                        original_author: message.sender_id,
                        deleted_by: session.user_id(),
                    }))
                    .await?;
                }
                Outcome::Skipped(reason) => {
                    warn!(room = %session.room, message_id = id, user_id = session.user_id(), %reason, "delete ignored");
                }
            },
            other @ InboundFrame::ContentUpdate { .. } => return Err(unsupported(ctx, &other)),
        }
        Ok(())
    }
}

/// Shared documents.
pub struct DocumentRoom {
    documents: DocumentService,
}

impl DocumentRoom {
    pub fn new(documents: DocumentService) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl RoomHandler for DocumentRoom {
    async fn handle(&self, ctx: &RoomContext, frame: InboundFrame) -> RealtimeResult<()> {
        match frame {
            InboundFrame::ContentUpdate { text } => {
                let snapshot = self.documents.apply(&ctx.session, &text).await?;
                ctx.broadcast_to_others(&OutboundFrame::ContentUpdate {
                    text: snapshot.content,
                })
                .await?;
                Ok(())
            }
            other => Err(unsupported(ctx, &other)),
        }
    }
}
