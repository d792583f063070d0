use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::UserId;

use super::Message;

/// A privileged action worth keeping a record of.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub actor: UserId,
    pub action: String,
    pub details: serde_json::Value,
}

impl AuditEntry {
    pub const MESSAGE_DELETE: &'static str = "message.delete";

    /// Moderator removed somebody else's message.
    pub fn message_deleted(actor: UserId, message: &Message) -> Self {
        Self {
            actor,
            action: Self::MESSAGE_DELETE.to_string(),
            details: json!({
                "message_id": message.id,
                "room": message.room.to_string(),
                "original_author": message.sender_id,
            }),
        }
    }
}
