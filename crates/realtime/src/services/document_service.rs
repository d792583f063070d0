//! Whole-content document sync.

use std::sync::Arc;

use tracing::debug;

use crate::entities::DocumentSnapshot;
use crate::repositories::DocumentStore;
use crate::types::RealtimeResult;
use crate::utils::TextSanitizer;

use super::Session;

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    sanitizer: Arc<dyn TextSanitizer>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, sanitizer: Arc<dyn TextSanitizer>) -> Self {
        Self { store, sanitizer }
    }

    /// Overwrite the document with sanitised `text`. Last writer wins.
    pub async fn apply(&self, session: &Session, text: &str) -> RealtimeResult<DocumentSnapshot> {
        let content = self.sanitizer.sanitize(text);
        let snapshot = self
            .store
            .replace_content(session.room.id, &content, session.user_id())
            .await?;
        debug!(room = %session.room, user_id = session.user_id(), bytes = snapshot.content.len(), "document replaced");
        Ok(snapshot)
    }
}
