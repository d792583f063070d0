//! Mention notifications for chat messages.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::entities::{Identity, NotificationPayload};
use crate::repositories::{NotificationSink, UserDirectory};
use crate::types::RoomKey;
use crate::utils::extract_mentions;

pub struct MentionService {
    directory: Arc<dyn UserDirectory>,
    notifier: Arc<dyn NotificationSink>,
    public_url: String,
}

impl MentionService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn NotificationSink>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            notifier,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Link back to the room a mention happened in.
    pub fn room_url(&self, room: &RoomKey) -> String {
        format!("{}/{}/{}", self.public_url, room.kind.path_segment(), room.id)
    }

    /// Notify every user mentioned in `text` except the sender.
    ///
    /// Returns how many notifications were handed to the sink. Unknown
    /// handles and lookup failures are skipped.
    pub async fn dispatch(&self, sender: &Identity, room: RoomKey, text: &str) -> usize {
        let handles = extract_mentions(text);
        if handles.is_empty() {
            return 0;
        }

        let url = self.room_url(&room);
        let message = format!("{} mentioned you: {}", sender.username, text);
        let mut notified = 0;

        for handle in handles {
            let target = match self.directory.find_by_username(&handle).await {
                Ok(Some(identity)) => identity,
                Ok(None) => continue,
                Err(err) => {
                    warn!(%room, handle, error = %err, "mention lookup failed");
                    continue;
                }
            };
            if target.user_id == sender.user_id {
                continue;
            }

            let payload = NotificationPayload::new(message.clone(), url.clone());
            match self.notifier.notify(target.user_id, payload).await {
                Ok(()) => notified += 1,
                Err(err) => {
                    warn!(%room, user_id = target.user_id, error = %err, "mention notification failed")
                }
            }
        }

        debug!(%room, user_id = sender.user_id, notified, "mentions dispatched");
        notified
    }

    /// Run [`dispatch`](Self::dispatch) in the background.
    pub fn spawn(self: &Arc<Self>, sender: Identity, room: RoomKey, text: String) -> JoinHandle<usize> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.dispatch(&sender, room, &text).await })
    }
}
