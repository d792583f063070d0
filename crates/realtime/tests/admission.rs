mod common;

use common::*;
use huddle_realtime::{Handshake, Rejection, RoomAccess};
use serde_json::json;

#[tokio::test]
async fn anonymous_connections_are_refused() {
    let ctx = TestContext::new().await;

    let rejection = ctx
        .hub
        .connect(&Handshake::anonymous(), conversation())
        .await
        .err()
        .expect("anonymous handshake must be refused");

    assert_eq!(rejection, Rejection::unauthenticated());
    assert_eq!(Rejection::CLOSE_CODE, 1008);
    assert_eq!(ctx.hub.registry().room_count(), 0);
}

#[tokio::test]
async fn unknown_and_blank_tokens_are_refused() {
    let ctx = TestContext::new().await;

    for token in ["nope", "   "] {
        let rejection = ctx
            .hub
            .connect(&Handshake::with_token(token), conversation())
            .await
            .err()
            .expect("unresolvable token must be refused");
        assert_eq!(rejection, Rejection::unauthenticated());
    }
}

#[tokio::test]
async fn non_members_are_refused_with_a_reason() {
    let ctx = TestContext::new().await;

    let rejection = ctx
        .hub
        .connect(&Handshake::with_token("dee-token"), conversation())
        .await
        .err()
        .expect("dee is not a participant");

    assert_eq!(rejection.reason, "not authorized for conversation:1");
    assert_eq!(ctx.hub.registry().room_count(), 0);
}

#[tokio::test]
async fn authorizer_outage_refuses_connection() {
    let ctx = TestContext::new().await;
    ctx.authorizer.fail_lookups(true);

    let rejection = ctx
        .hub
        .connect(&Handshake::with_token("ana-token"), conversation())
        .await
        .err()
        .expect("lookups are failing");
    assert_eq!(rejection, Rejection::unavailable());
}

#[tokio::test]
async fn admitted_connection_carries_its_session_until_dropped() {
    let ctx = TestContext::new().await;
    let (cy, _rx) = ctx.join("cy-token", conversation()).await;

    assert_eq!(cy.session().identity.username, "cy");
    assert_eq!(cy.session().access, RoomAccess::Moderator);
    assert!(ctx.hub.registry().contains(&conversation(), cy.id()));

    drop(cy);
    assert_eq!(ctx.hub.registry().room_count(), 0);
}

#[tokio::test]
async fn access_is_not_rechecked_per_frame() {
    let ctx = TestContext::new().await;
    let (ana, mut rx) = ctx.join("ana-token", conversation()).await;

    ctx.authorizer.fail_lookups(true);
    ana.process(&frame("new_message", json!({"text": "still admitted"})))
        .await;

    assert_eq!(next_frame(&mut rx).await["payload"]["text"], "still admitted");
}

#[tokio::test]
async fn conversation_and_event_with_same_id_are_separate_rooms() {
    let ctx = TestContext::new().await;
    let (_in_conversation, mut conversation_rx) = ctx.join("bo-token", conversation()).await;
    let (in_event, mut event_rx) = ctx.join("ana-token", event()).await;

    in_event
        .process(&frame("new_message", json!({"text": "event only"})))
        .await;

    let received = next_frame(&mut event_rx).await;
    assert_eq!(received["payload"]["room"], json!({"kind": "event", "id": 1}));
    assert_silent(&mut conversation_rx).await;
    assert_eq!(ctx.hub.registry().room_count(), 2);
}

#[tokio::test]
async fn identify_resolves_without_joining() {
    let ctx = TestContext::new().await;

    let identity = ctx
        .hub
        .identify(&Handshake::with_token("bo-token"))
        .await
        .expect("bo resolves");
    assert_eq!(identity.user_id, BO);
    assert!(ctx.hub.identify(&Handshake::anonymous()).await.is_none());
    assert_eq!(ctx.hub.registry().room_count(), 0);
}
