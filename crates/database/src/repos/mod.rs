//! Database repository implementations

pub mod audit_repository;
pub mod document_repository;
pub mod membership_repository;
pub mod message_repository;
pub mod notification_repository;
pub mod user_repository;

pub use audit_repository::AuditRepository;
pub use document_repository::DocumentRepository;
pub use membership_repository::MembershipRepository;
pub use message_repository::MessageRepository;
pub use notification_repository::NotificationRepository;
pub use user_repository::UserRepository;
