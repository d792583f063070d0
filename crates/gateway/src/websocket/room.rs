//! Room sockets: one per conversation, event chat or document.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use huddle_realtime::{Handshake, Hub, RoomKey, RoomKind};
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::middleware::{handshake_from, WebSocketQuery};
use crate::state::GatewayState;

use super::reject;

pub async fn conversation_socket(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<WebSocketQuery>,
    headers: HeaderMap,
) -> GatewayResult<Response> {
    upgrade(RoomKind::Conversation, ws, state, &id, query, &headers)
}

pub async fn event_socket(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<WebSocketQuery>,
    headers: HeaderMap,
) -> GatewayResult<Response> {
    upgrade(RoomKind::Event, ws, state, &id, query, &headers)
}

pub async fn document_socket(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<WebSocketQuery>,
    headers: HeaderMap,
) -> GatewayResult<Response> {
    upgrade(RoomKind::Document, ws, state, &id, query, &headers)
}

fn parse_room(kind: RoomKind, raw: &str) -> GatewayResult<RoomKey> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(RoomKey::new(kind, id)),
        _ => Err(GatewayError::InvalidRequest(format!(
            "{kind} id must be a positive integer"
        ))),
    }
}

fn upgrade(
    kind: RoomKind,
    ws: WebSocketUpgrade,
    state: GatewayState,
    raw_id: &str,
    query: WebSocketQuery,
    headers: &HeaderMap,
) -> GatewayResult<Response> {
    let room = parse_room(kind, raw_id)?;
    let handshake = handshake_from(query, headers);
    let hub = state.hub;
    Ok(ws.on_upgrade(move |socket| serve_room(socket, hub, handshake, room)))
}

/// Pump frames between the socket and the hub until either side goes away.
async fn serve_room(socket: WebSocket, hub: Hub, handshake: Handshake, room: RoomKey) {
    let (mut sink, mut stream) = socket.split();

    let (connection, mut outbound) = match hub.connect(&handshake, room).await {
        Ok(admitted) => admitted,
        Err(rejection) => {
            reject(&mut sink, &rejection).await;
            return;
        }
    };

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame.to_string())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => connection.process(&text).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    debug!(%room, connection = %connection.id(), %error, "socket read failed");
                    break;
                }
            },
            _ = connection.evicted() => {
                warn!(%room, connection = %connection.id(), "closing evicted connection");
                break;
            }
            _ = &mut writer => break,
        }
    }

    drop(connection);
    writer.abort();
}
