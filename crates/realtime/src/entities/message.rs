use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MessageId, NoOp, RoomKey, UserId};

use super::Identity;

/// Lifecycle state of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    Sent,
    Edited,
    Deleted,
}

impl MessageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageState::Sent => "sent",
            MessageState::Edited => "edited",
            MessageState::Deleted => "deleted",
        }
    }
}

impl std::str::FromStr for MessageState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(MessageState::Sent),
            "edited" => Ok(MessageState::Edited),
            "deleted" => Ok(MessageState::Deleted),
            other => Err(format!("unknown message state `{other}`")),
        }
    }
}

/// A persisted chat message. Deleted messages keep their row with a tombstone body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub room: RoomKey,
    pub sender_id: UserId,
    pub body: String,
    pub state: MessageState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set once the message has been soft-deleted
    pub deleted_by: Option<UserId>,
}

impl Message {
    pub fn is_deleted(&self) -> bool {
        self.state == MessageState::Deleted
    }

    /// Whether `editor` may replace the body at `now` given the edit window.
    pub fn check_editable(
        &self,
        editor: UserId,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<(), NoOp> {
        if self.sender_id != editor {
            return Err(NoOp::NotAuthor);
        }
        if self.is_deleted() {
            return Err(NoOp::AlreadyDeleted);
        }
        if now - self.created_at > window {
            return Err(NoOp::EditWindowElapsed);
        }
        Ok(())
    }

    /// Whether `actor` may soft-delete this message.
    pub fn check_deletable(&self, actor: UserId, privileged: bool) -> Result<(), NoOp> {
        if self.is_deleted() {
            return Err(NoOp::AlreadyDeleted);
        }
        if !privileged && self.sender_id != actor {
            return Err(NoOp::NotAuthor);
        }
        Ok(())
    }
}

/// A message about to be persisted
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub room: RoomKey,
    pub sender_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Conditional body replacement.
///
/// Stores apply it only while the message is still authored by `editor`, not
/// deleted, and created no earlier than `not_before`.
#[derive(Debug, Clone)]
pub struct MessageEdit {
    pub id: MessageId,
    pub room: RoomKey,
    pub editor: UserId,
    pub body: String,
    pub not_before: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

/// Conditional soft delete.
///
/// Stores apply it only while the message is not deleted and, unless
/// `privileged`, still authored by `actor`.
#[derive(Debug, Clone)]
pub struct MessageDeletion {
    pub id: MessageId,
    pub room: RoomKey,
    pub actor: UserId,
    pub privileged: bool,
    pub tombstone: String,
    pub deleted_at: DateTime<Utc>,
}

impl MessageDeletion {
    pub fn tombstone_for(username: &str) -> String {
        format!("This message was deleted by {username}.")
    }
}

/// A message as broadcast to room members, with display metadata resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageView {
    pub id: MessageId,
    pub room: RoomKey,
    pub sender_id: UserId,
    pub username: String,
    pub color: Option<String>,
    pub text: String,
    pub state: MessageState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageView {
    pub fn new(message: Message, sender: &Identity) -> Self {
        Self {
            id: message.id,
            room: message.room,
            sender_id: message.sender_id,
            username: sender.username.clone(),
            color: sender.color.clone(),
            text: message.body,
            state: message.state,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}
