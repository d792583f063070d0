//! Business logic of the room engine.

pub mod document_service;
pub mod gatekeeper;
pub mod hub;
pub mod mention_service;
pub mod message_service;
pub mod notification_service;
pub mod registry;
pub mod room;

pub use document_service::DocumentService;
pub use gatekeeper::{Gatekeeper, Session};
pub use hub::{Connection, Hub, HubCollaborators};
pub use mention_service::MentionService;
pub use message_service::MessageService;
pub use notification_service::{NotificationService, UserChannels, UserSubscription};
pub use registry::{ConnectionHandle, RoomMembership, RoomRegistry};
pub use room::{ChatRoom, DocumentRoom, RoomContext, RoomHandler};
