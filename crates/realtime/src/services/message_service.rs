//! Message lifecycle: send, edit, soft delete.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::entities::{AuditEntry, Message, MessageDeletion, MessageEdit, MessageView, NewMessage};
use crate::repositories::{AuditLog, MessageStore};
use crate::types::{MessageId, NoOp, Outcome, RealtimeResult};
use crate::utils::{TextSanitizer, Validator};

use super::Session;

/// Service for chat message operations
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    audit: Arc<dyn AuditLog>,
    sanitizer: Arc<dyn TextSanitizer>,
    edit_window: chrono::Duration,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        audit: Arc<dyn AuditLog>,
        sanitizer: Arc<dyn TextSanitizer>,
        edit_window: Duration,
    ) -> Self {
        Self {
            store,
            audit,
            sanitizer,
            edit_window: chrono::Duration::from_std(edit_window)
                .unwrap_or_else(|_| chrono::Duration::max_value()),
        }
    }

    /// Sanitise, persist and return the message as it should be broadcast.
    pub async fn create(&self, session: &Session, text: &str) -> RealtimeResult<MessageView> {
        let body = self.prepare(text)?;

        let message = self
            .store
            .create(NewMessage {
                room: session.room,
                sender_id: session.user_id(),
                body,
                created_at: Utc::now(),
            })
            .await?;

        debug!(room = %session.room, message_id = message.id, user_id = session.user_id(), "message stored");
        Ok(MessageView::new(message, &session.identity))
    }

    /// Replace the body of the caller's own message while the edit window is open.
    pub async fn update(
        &self,
        session: &Session,
        id: MessageId,
        text: &str,
    ) -> RealtimeResult<Outcome<Message>> {
        let body = self.prepare(text)?;

        let now = Utc::now();
        let Some(current) = self.store.get(&session.room, id).await? else {
            return Ok(Outcome::Skipped(NoOp::NotFound));
        };
        if let Err(reason) = current.check_editable(session.user_id(), now, self.edit_window) {
            return Ok(Outcome::Skipped(reason));
        }

        let edit = MessageEdit {
            id,
            room: session.room,
            editor: session.user_id(),
            body,
            not_before: self.window_start(now),
            edited_at: now,
        };
        Ok(match self.store.update_body(edit).await? {
            Some(updated) => Outcome::Applied(updated),
            None => Outcome::Skipped(NoOp::Stale),
        })
    }

    /// Replace the body with a tombstone. Moderators may delete anyone's message.
    pub async fn delete(&self, session: &Session, id: MessageId) -> RealtimeResult<Outcome<Message>> {
        let actor = session.user_id();
        let privileged = session.is_privileged();

        let Some(current) = self.store.get(&session.room, id).await? else {
            return Ok(Outcome::Skipped(NoOp::NotFound));
        };
        if let Err(reason) = current.check_deletable(actor, privileged) {
            return Ok(Outcome::Skipped(reason));
        }

        let deletion = MessageDeletion {
            id,
            room: session.room,
            actor,
            privileged,
            tombstone: MessageDeletion::tombstone_for(&session.identity.username),
            deleted_at: Utc::now(),
        };
        let Some(deleted) = self.store.soft_delete(deletion).await? else {
            return Ok(Outcome::Skipped(NoOp::Stale));
        };

        if deleted.sender_id != actor {
            if let Err(err) = self
                .audit
                .record(AuditEntry::message_deleted(actor, &deleted))
                .await
            {
                error!(room = %session.room, message_id = id, user_id = actor, error = %err, "failed to write audit entry");
            }
        }

        Ok(Outcome::Applied(deleted))
    }

    /// Trim, check the length the sender sees, then escape.
    fn prepare(&self, text: &str) -> RealtimeResult<String> {
        let text = text.trim();
        Validator::message_text(text)?;
        let body = self.sanitizer.sanitize(text);
        Validator::message_body(&body)?;
        Ok(body)
    }

    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.edit_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
