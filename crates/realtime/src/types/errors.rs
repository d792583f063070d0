//! Error types for the room engine.

use std::fmt;

use thiserror::Error;

use super::{RoomKey, RoomKind};

/// Result type alias for engine operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Failure reported by a collaborator (persistence, directory, audit log).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("stored data is invalid: {0}")]
    Corrupt(String),

    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(error))
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Main error type for frame handling
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("`{frame}` frames are not accepted in {room} rooms")]
    UnsupportedFrame { frame: &'static str, room: RoomKind },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("failed to encode outbound frame: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RealtimeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Frame-level problems are dropped quietly; everything else aborted real work.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RealtimeError::MalformedFrame(_)
                | RealtimeError::UnsupportedFrame { .. }
                | RealtimeError::Validation { .. }
        )
    }
}

/// Handshake refusal, sent to the peer as a policy-violation close.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Rejection {
    pub reason: String,
}

impl Rejection {
    /// WebSocket close code 1008.
    pub const CLOSE_CODE: u16 = 1008;

    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn unauthenticated() -> Self {
        Self::new("authentication required")
    }

    pub fn forbidden(room: &RoomKey) -> Self {
        Self::new(format!("not authorized for {room}"))
    }

    pub fn unavailable() -> Self {
        Self::new("authorization is temporarily unavailable")
    }
}

/// Why an edit or delete left the stored message untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOp {
    /// No such message in this room.
    NotFound,
    /// The caller is neither the author nor privileged.
    NotAuthor,
    /// The message is already a tombstone.
    AlreadyDeleted,
    /// The edit window has elapsed.
    EditWindowElapsed,
    /// The record changed between the check and the conditional write.
    Stale,
}

impl fmt::Display for NoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoOp::NotFound => "message not found in room",
            NoOp::NotAuthor => "caller may not modify this message",
            NoOp::AlreadyDeleted => "message already deleted",
            NoOp::EditWindowElapsed => "edit window elapsed",
            NoOp::Stale => "message changed concurrently",
        };
        f.write_str(text)
    }
}

/// Result of an operation whose refusal is silent on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Applied(T),
    Skipped(NoOp),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn skipped(&self) -> Option<NoOp> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Skipped(reason) => Some(*reason),
        }
    }
}
