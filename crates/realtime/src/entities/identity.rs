use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// An authenticated user as seen by the room engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    /// Display colour shown next to the user's messages
    pub color: Option<String>,
}

impl Identity {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Credentials presented when a connection is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handshake {
    pub token: Option<String>,
}

impl Handshake {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// The presented token, ignoring blank values.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}
