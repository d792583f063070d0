//! Per-user notification delivery.
//!
//! A user may hold any number of notification streams; each online user has
//! one broadcast sender, removed again when their last stream closes.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::entities::NotificationPayload;
use crate::repositories::NotificationSink;
use crate::types::{StoreError, UserId};

#[derive(Debug, Clone)]
pub struct UserChannels {
    channels: Arc<DashMap<UserId, broadcast::Sender<NotificationPayload>>>,
    buffer: usize,
}

impl UserChannels {
    pub fn new(buffer: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Open a live stream of notifications for `user_id`.
    pub fn subscribe(&self, user_id: UserId) -> UserSubscription {
        let receiver = self
            .channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.buffer).0)
            .subscribe();
        debug!(user_id, "notification stream opened");
        UserSubscription {
            channels: self.clone(),
            user_id,
            receiver: Some(receiver),
        }
    }

    /// Push to the user's live streams. Returns the number of streams reached.
    pub fn publish(&self, user_id: UserId, payload: NotificationPayload) -> usize {
        self.channels
            .get(&user_id)
            .and_then(|sender| sender.send(payload).ok())
            .unwrap_or(0)
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.channels.contains_key(&user_id)
    }

    pub fn online_users(&self) -> usize {
        self.channels.len()
    }

    fn release(&self, user_id: UserId) {
        self.channels
            .remove_if(&user_id, |_, sender| sender.receiver_count() == 0);
    }
}

/// One open notification stream.
pub struct UserSubscription {
    channels: UserChannels,
    user_id: UserId,
    receiver: Option<broadcast::Receiver<NotificationPayload>>,
}

impl UserSubscription {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Next notification, or `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<NotificationPayload> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(user_id = self.user_id, skipped, "notification stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for UserSubscription {
    fn drop(&mut self) {
        // The receiver must be gone before the count is checked.
        self.receiver.take();
        self.channels.release(self.user_id);
        debug!(user_id = self.user_id, "notification stream closed");
    }
}

/// Persists each notification and pushes it to any live stream of the user.
pub struct NotificationService {
    channels: UserChannels,
    durable: Arc<dyn NotificationSink>,
}

impl NotificationService {
    pub fn new(channels: UserChannels, durable: Arc<dyn NotificationSink>) -> Self {
        Self { channels, durable }
    }
}

#[async_trait]
impl NotificationSink for NotificationService {
    async fn notify(&self, user_id: UserId, payload: NotificationPayload) -> Result<(), StoreError> {
        let stored = self.durable.notify(user_id, payload.clone()).await;
        if let Err(err) = &stored {
            error!(user_id, error = %err, "failed to persist notification");
        }
        let streams = self.channels.publish(user_id, payload);
        debug!(user_id, streams, "notification delivered");
        stored
    }
}
