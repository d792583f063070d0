//! Shared types and interfaces for the room engine.
//!
//! Room keys, access levels, wire frames and error definitions used across
//! every module in the crate.

pub mod errors;
pub mod events;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use errors::{NoOp, Outcome, RealtimeError, RealtimeResult, Rejection, StoreError};
pub use events::{InboundFrame, MessageSoftDeleted, MessageUpdated, OutboundFrame};

// Common type aliases
pub type UserId = i64;
pub type MessageId = i64;
pub type ConnectionId = uuid::Uuid;

/// A serialised outbound frame, shared between every recipient of a broadcast.
pub type Frame = Arc<str>;

/// The kind of resource a room is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Conversation,
    Event,
    Document,
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::Conversation => "conversation",
            RoomKind::Event => "event",
            RoomKind::Document => "document",
        }
    }

    /// URL segment used when linking back to a room of this kind.
    pub fn path_segment(&self) -> &'static str {
        match self {
            RoomKind::Conversation => "conversations",
            RoomKind::Event => "events",
            RoomKind::Document => "documents",
        }
    }

    /// Conversations and event chats carry messages; documents carry content.
    pub fn is_chat(&self) -> bool {
        matches!(self, RoomKind::Conversation | RoomKind::Event)
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conversation" => Ok(RoomKind::Conversation),
            "event" => Ok(RoomKind::Event),
            "document" => Ok(RoomKind::Document),
            other => Err(format!("unknown room kind `{other}`")),
        }
    }
}

/// Identifies one broadcast domain. Conversation 7 and event 7 are different rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomKey {
    pub kind: RoomKind,
    pub id: i64,
}

impl RoomKey {
    pub fn new(kind: RoomKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn conversation(id: i64) -> Self {
        Self::new(RoomKind::Conversation, id)
    }

    pub fn event(id: i64) -> Self {
        Self::new(RoomKind::Event, id)
    }

    pub fn document(id: i64) -> Self {
        Self::new(RoomKind::Document, id)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// What an identity may do in a room, as decided by the authorizer at handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomAccess {
    Denied,
    Member,
    /// Room owner, event organiser or admin. May delete anyone's message.
    Moderator,
}

impl RoomAccess {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, RoomAccess::Denied)
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, RoomAccess::Moderator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_keys_of_different_kinds_are_distinct() {
        assert_ne!(RoomKey::conversation(7), RoomKey::event(7));
        assert_eq!(RoomKey::document(3).to_string(), "document:3");
    }

    #[test]
    fn room_kind_round_trips_through_str() {
        for kind in [RoomKind::Conversation, RoomKind::Event, RoomKind::Document] {
            assert_eq!(kind.as_str().parse::<RoomKind>(), Ok(kind));
        }
        assert!("checklist".parse::<RoomKind>().is_err());
    }

    #[test]
    fn only_moderators_are_privileged() {
        assert!(!RoomAccess::Denied.is_allowed());
        assert!(RoomAccess::Member.is_allowed());
        assert!(!RoomAccess::Member.is_privileged());
        assert!(RoomAccess::Moderator.is_privileged());
    }
}
