//! Validation utilities.

use crate::types::{RealtimeError, RealtimeResult};

/// Longest message body accepted, counted in characters.
pub const MAX_MESSAGE_CHARS: usize = 10_000;

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Validate message text as the user typed it, before escaping.
    pub fn message_text(text: &str) -> RealtimeResult<()> {
        Self::message_body(text)?;

        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(RealtimeError::validation(format!(
                "Message text too long (max {MAX_MESSAGE_CHARS} characters)"
            )));
        }

        Ok(())
    }

    /// Reject text that is blank once sanitised.
    pub fn message_body(body: &str) -> RealtimeResult<()> {
        if body.trim().is_empty() {
            return Err(RealtimeError::validation("Message text cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_and_oversized_text() {
        assert!(Validator::message_text("   ").is_err());
        assert!(Validator::message_text(&"x".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
        assert!(Validator::message_text(&"é".repeat(MAX_MESSAGE_CHARS)).is_ok());
    }

    #[test]
    fn body_must_not_be_blank() {
        assert!(Validator::message_body("").is_err());
        assert!(Validator::message_body(" \n\t").is_err());
        assert!(Validator::message_body("&lt;").is_ok());
    }
}
