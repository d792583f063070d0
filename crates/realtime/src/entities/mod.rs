//! Records persisted by collaborators and the views broadcast to rooms.

pub mod audit;
pub mod document;
pub mod identity;
pub mod message;
pub mod notification;

pub use audit::AuditEntry;
pub use document::DocumentSnapshot;
pub use identity::{Handshake, Identity};
pub use message::{
    Message, MessageDeletion, MessageEdit, MessageState, MessageView, NewMessage,
};
pub use notification::NotificationPayload;
