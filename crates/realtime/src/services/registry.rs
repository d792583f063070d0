//! Room membership and fan-out.
//!
//! Each room maps to an immutable, reference-counted member set. Joins and
//! leaves clone-and-swap the set under the room's shard lock, while broadcasts
//! take a snapshot of the current `Arc` and write to every member without
//! holding any lock. A broadcast racing a join either reaches the newcomer or
//! not, but never faults and never duplicates a target.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

use crate::types::{ConnectionId, Frame, RoomKey, UserId};

/// Sending side of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    user_id: UserId,
    sender: mpsc::Sender<Frame>,
    eviction: Arc<Notify>,
}

impl ConnectionHandle {
    /// Create a handle with a bounded outbound queue of `buffer` frames.
    pub fn new(user_id: UserId, buffer: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let handle = Self {
            id: ConnectionId::new_v4(),
            user_id,
            sender,
            eviction: Arc::new(Notify::new()),
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Tell the transport driving this connection to shut it down.
    pub fn evict(&self) {
        self.eviction.notify_one();
    }

    pub(crate) fn eviction(&self) -> Arc<Notify> {
        Arc::clone(&self.eviction)
    }
}

type Members = Arc<HashMap<ConnectionId, ConnectionHandle>>;

/// Concurrent map from room to its live connections.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomKey, Members>>,
    send_timeout: Duration,
}

impl RoomRegistry {
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            send_timeout,
        }
    }

    /// Add a connection to `room`, creating the room if needed.
    ///
    /// The connection stays a member until the returned guard is dropped or
    /// a broadcast finds it closed or unresponsive.
    pub fn join(&self, room: RoomKey, handle: ConnectionHandle) -> RoomMembership {
        let connection = handle.id;
        let user_id = handle.user_id;
        {
            let mut members = self.rooms.entry(room).or_default();
            Arc::make_mut(members.value_mut()).insert(connection, handle);
        }
        debug!(%room, %connection, user_id, "joined room");
        RoomMembership {
            registry: self.clone(),
            room,
            connection,
        }
    }

    /// Remove a connection; the room itself goes away once empty.
    pub fn leave(&self, room: &RoomKey, connection: ConnectionId) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => Arc::make_mut(members.value_mut())
                .remove(&connection)
                .is_some(),
            None => false,
        };
        self.rooms.remove_if(room, |_, members| members.is_empty());
        if removed {
            debug!(%room, %connection, "left room");
        }
        removed
    }

    /// Send `frame` to every member. Returns how many accepted it.
    pub async fn broadcast(&self, room: &RoomKey, frame: Frame) -> usize {
        self.fan_out(room, frame, None).await
    }

    /// Send `frame` to every member except `excluded`.
    pub async fn broadcast_except(
        &self,
        room: &RoomKey,
        frame: Frame,
        excluded: ConnectionId,
    ) -> usize {
        self.fan_out(room, frame, Some(excluded)).await
    }

    async fn fan_out(&self, room: &RoomKey, frame: Frame, excluded: Option<ConnectionId>) -> usize {
        let Some(members) = self.snapshot(room) else {
            return 0;
        };

        let timeout = self.send_timeout;
        let sends = members
            .values()
            .filter(|handle| Some(handle.id) != excluded)
            .map(|handle| {
                let frame = Frame::clone(&frame);
                async move { (handle, handle.sender.send_timeout(frame, timeout).await) }
            });

        let mut delivered = 0;
        for (handle, result) in join_all(sends).await {
            match result {
                Ok(()) => delivered += 1,
                Err(SendTimeoutError::Closed(_)) => {
                    debug!(%room, connection = %handle.id, "skipping closed connection");
                    self.leave(room, handle.id);
                }
                Err(SendTimeoutError::Timeout(_)) => {
                    warn!(
                        %room,
                        connection = %handle.id,
                        user_id = handle.user_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "evicting unresponsive connection"
                    );
                    self.leave(room, handle.id);
                    handle.evict();
                }
            }
        }
        delivered
    }

    fn snapshot(&self, room: &RoomKey) -> Option<Members> {
        self.rooms.get(room).map(|members| Arc::clone(members.value()))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self, room: &RoomKey) -> usize {
        self.snapshot(room).map_or(0, |members| members.len())
    }

    pub fn contains(&self, room: &RoomKey, connection: ConnectionId) -> bool {
        self.snapshot(room)
            .is_some_and(|members| members.contains_key(&connection))
    }
}

/// Keeps a connection in its room; leaves on drop.
#[derive(Debug)]
pub struct RoomMembership {
    registry: RoomRegistry,
    room: RoomKey,
    connection: ConnectionId,
}

impl RoomMembership {
    pub fn room(&self) -> RoomKey {
        self.room
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }
}

impl Drop for RoomMembership {
    fn drop(&mut self) {
        self.registry.leave(&self.room, self.connection);
    }
}
