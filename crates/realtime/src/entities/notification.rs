use serde::{Deserialize, Serialize};

/// Out-of-band notification delivered to a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationPayload {
    pub message: String,
    pub url: String,
}

impl NotificationPayload {
    pub fn new(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            url: url.into(),
        }
    }
}
