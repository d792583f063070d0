//! Wire frames exchanged with room members.
//!
//! Every frame is a `{"type": ..., "payload": {...}}` envelope.

use serde::{Deserialize, Serialize};

use crate::entities::MessageView;

use super::{Frame, MessageId, UserId};

/// Frames a client may send into a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundFrame {
    NewMessage { text: String },
    UpdateMessage { id: MessageId, text: String },
    DeleteMessage { id: MessageId },
    ContentUpdate { text: String },
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InboundFrame::NewMessage { .. } => "new_message",
            InboundFrame::UpdateMessage { .. } => "update_message",
            InboundFrame::DeleteMessage { .. } => "delete_message",
            InboundFrame::ContentUpdate { .. } => "content_update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageUpdated {
    pub id: MessageId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSoftDeleted {
    pub id: MessageId,
    pub original_author: UserId,
    pub deleted_by: UserId,
}

/// Frames the server fans out to room members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundFrame {
    NewMessage(MessageView),
    MessageUpdated(MessageUpdated),
    MessageSoftDeleted(MessageSoftDeleted),
    ContentUpdate { text: String },
}

impl OutboundFrame {
    /// Serialise once so every recipient shares the same buffer.
    pub fn encode(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::from)
    }
}
