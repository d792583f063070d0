//! Per-user notification stream.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use huddle_realtime::{Handshake, NotificationPayload, Rejection};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::GatewayError;
use crate::middleware::{handshake_from, WebSocketQuery};
use crate::state::GatewayState;

use super::reject;

#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum NotificationFrame<'a> {
    Notification(&'a NotificationPayload),
}

impl NotificationFrame<'_> {
    pub fn encode(&self) -> Result<String, GatewayError> {
        Ok(serde_json::to_string(self)?)
    }
}

pub async fn notification_socket(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    Query(query): Query<WebSocketQuery>,
    headers: HeaderMap,
) -> Response {
    let handshake = handshake_from(query, &headers);
    ws.on_upgrade(move |socket| serve_notifications(socket, state, handshake))
}

async fn serve_notifications(socket: WebSocket, state: GatewayState, handshake: Handshake) {
    let (mut sink, mut stream) = socket.split();

    let Some(identity) = state.hub.identify(&handshake).await else {
        reject(&mut sink, &Rejection::unauthenticated()).await;
        return;
    };

    let user_id = identity.user_id;
    let mut subscription = state.channels.subscribe(user_id);
    info!(user_id, "notification stream opened");

    loop {
        tokio::select! {
            payload = subscription.recv() => {
                let Some(payload) = payload else { break };
                let text = match NotificationFrame::Notification(&payload).encode() {
                    Ok(text) => text,
                    Err(err) => {
                        error!(user_id, error = %err, "failed to encode notification");
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    debug!(user_id, %error, "socket read failed");
                    break;
                }
            },
        }
    }

    info!(user_id, "notification stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_use_the_frame_envelope() {
        let payload = NotificationPayload::new("ana mentioned you: hi", "http://x/events/1");
        let text = NotificationFrame::Notification(&payload).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "notification");
        assert_eq!(value["payload"]["url"], "http://x/events/1");
    }
}
