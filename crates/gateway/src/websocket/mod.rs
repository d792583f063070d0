//! WebSocket endpoints for the gateway

pub mod notifications;
pub mod room;

use std::borrow::Cow;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::{routing::get, Router};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use huddle_realtime::Rejection;
use tracing::debug;

use crate::state::GatewayState;

/// Create all WebSocket routes
pub fn create_websocket_routes() -> Router<GatewayState> {
    Router::new()
        .route("/ws/conversations/:id", get(room::conversation_socket))
        .route("/ws/events/:id", get(room::event_socket))
        .route("/ws/documents/:id", get(room::document_socket))
        .route("/ws/notifications", get(notifications::notification_socket))
}

/// Close an upgraded socket with a policy violation.
pub(crate) async fn reject(sink: &mut SplitSink<WebSocket, Message>, rejection: &Rejection) {
    let frame = CloseFrame {
        code: Rejection::CLOSE_CODE,
        reason: Cow::Owned(rejection.reason.clone()),
    };
    if let Err(error) = sink.send(Message::Close(Some(frame))).await {
        debug!(%error, "peer went away before the close frame");
    }
}
