//! # Huddle Realtime Crate
//!
//! Room-based messaging and collaborative editing engine. Live connections are
//! grouped into rooms (a conversation, an event's chat, a shared document) and
//! every frame a member sends is persisted through a collaborator before it is
//! fanned out to the rest of the room.
//!
//! ## Architecture
//!
//! - **Entities**: persisted records and wire views (messages, documents, identities)
//! - **Repositories**: collaborator traits the engine consumes, plus in-memory versions
//! - **Services**: room registry, gatekeeper, message lifecycle, mentions, document sync
//! - **Types**: room keys, frames, and error definitions
//! - **Utils**: text sanitising and mention parsing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use huddle_realtime::{Handshake, Hub, RoomKey};
//!
//! let hub = Hub::new(collaborators, &config.realtime);
//! let (connection, mut outbound) = hub.connect(&Handshake::with_token(token), RoomKey::conversation(7)).await?;
//! connection.process(r#"{"type":"new_message","payload":{"text":"hi"}}"#).await;
//! ```

pub mod entities;
pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;

pub use entities::{
    AuditEntry, DocumentSnapshot, Handshake, Identity, Message, MessageDeletion, MessageEdit,
    MessageState, MessageView, NewMessage, NotificationPayload,
};
pub use repositories::{
    AuditLog, DocumentStore, IdentityResolver, MessageStore, NotificationSink, RoomAuthorizer,
    UserDirectory,
};
pub use services::{
    ChatRoom, Connection, ConnectionHandle, DocumentRoom, DocumentService, Gatekeeper, Hub,
    HubCollaborators, MentionService, MessageService, NotificationService, RoomContext,
    RoomHandler, RoomMembership, RoomRegistry, Session, UserChannels, UserSubscription,
};
pub use types::{
    ConnectionId, Frame, InboundFrame, MessageId, NoOp, Outcome, OutboundFrame,
    RealtimeError, RealtimeResult, Rejection, RoomAccess, RoomKey, RoomKind, StoreError,
    UserId,
};
pub use utils::{HtmlSanitizer, TextSanitizer};
