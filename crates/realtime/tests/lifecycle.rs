mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::*;
use huddle_realtime::repositories::memory::{MemoryAuditLog, MemoryMessageStore};
use huddle_realtime::{
    AuditEntry, HtmlSanitizer, Identity, Message, MessageService, MessageState, NoOp, Outcome,
    RealtimeError, RoomAccess, Session,
};
use serde_json::json;

#[tokio::test]
async fn new_message_reaches_every_member_including_sender() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;
    let (_bo, mut bo_rx) = ctx.join("bo-token", conversation()).await;

    ana.handle_text(&frame("new_message", json!({"text": "hello <b>team</b>"})))
        .await
        .expect("message accepted");

    for rx in [&mut ana_rx, &mut bo_rx] {
        let received = next_frame(rx).await;
        assert_eq!(received["type"], "new_message");
        let payload = &received["payload"];
        assert_eq!(payload["text"], "hello &lt;b&gt;team&lt;/b&gt;");
        assert_eq!(payload["username"], "ana");
        assert_eq!(payload["color"], "#e11d48");
        assert_eq!(payload["sender_id"], ANA);
        assert_eq!(payload["state"], "sent");
    }

    let stored = ctx.messages.in_room(&conversation()).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].state, MessageState::Sent);
}

#[tokio::test]
async fn blank_and_malformed_frames_are_dropped_without_closing() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;

    let blank = ana
        .handle_text(&frame("new_message", json!({"text": "   "})))
        .await;
    assert!(matches!(blank, Err(RealtimeError::Validation { .. })));

    let malformed = ana.handle_text("{not json").await;
    assert!(matches!(malformed, Err(RealtimeError::MalformedFrame(_))));

    let unknown = ana
        .handle_text(&frame("add_item", json!({"text": "milk"})))
        .await;
    assert!(matches!(unknown, Err(RealtimeError::MalformedFrame(_))));

    ana.process("garbage").await;
    assert_silent(&mut ana_rx).await;
    assert!(ctx.messages.in_room(&conversation()).await.is_empty());

    ana.process(&frame("new_message", json!({"text": "still here"})))
        .await;
    assert_eq!(next_frame(&mut ana_rx).await["payload"]["text"], "still here");
}

#[tokio::test]
async fn document_frames_are_rejected_in_chat_rooms() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;

    let result = ana
        .handle_text(&frame("content_update", json!({"text": "draft"})))
        .await;
    assert!(matches!(
        result,
        Err(RealtimeError::UnsupportedFrame { frame: "content_update", .. })
    ));
    assert_silent(&mut ana_rx).await;
}

#[tokio::test]
async fn author_can_edit_inside_the_window() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;
    let (_bo, mut bo_rx) = ctx.join("bo-token", conversation()).await;

    ana.process(&frame("new_message", json!({"text": "helo"}))).await;
    let id = next_frame(&mut ana_rx).await["payload"]["id"].clone();
    next_frame(&mut bo_rx).await;

    ana.process(&frame("update_message", json!({"id": id, "text": "hello"})))
        .await;

    for rx in [&mut ana_rx, &mut bo_rx] {
        assert_eq!(
            next_frame(rx).await,
            json!({"type": "message_updated", "payload": {"id": id, "text": "hello"}})
        );
    }

    let stored = ctx.messages.in_room(&conversation()).await;
    assert_eq!(stored[0].body, "hello");
    assert_eq!(stored[0].state, MessageState::Edited);
}

#[tokio::test]
async fn editing_someone_elses_message_is_a_silent_no_op() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;
    let (bo, mut bo_rx) = ctx.join("bo-token", conversation()).await;

    ana.process(&frame("new_message", json!({"text": "mine"}))).await;
    let id = next_frame(&mut ana_rx).await["payload"]["id"].clone();
    next_frame(&mut bo_rx).await;

    bo.handle_text(&frame("update_message", json!({"id": id, "text": "yours"})))
        .await
        .expect("refusals are not errors");

    assert_silent(&mut ana_rx).await;
    assert_silent(&mut bo_rx).await;
    let stored = ctx.messages.in_room(&conversation()).await;
    assert_eq!(stored[0].body, "mine");
    assert_eq!(stored[0].state, MessageState::Sent);
}

#[tokio::test]
async fn editing_after_the_window_is_a_silent_no_op() {
    let ctx = TestContext::new().await;
    let created_at = Utc::now() - chrono::Duration::hours(1);
    ctx.messages
        .insert(Message {
            id: 40,
            room: conversation(),
            sender_id: ANA,
            body: "old".into(),
            state: MessageState::Sent,
            created_at,
            updated_at: created_at,
            deleted_by: None,
        })
        .await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;

    ana.process(&frame("update_message", json!({"id": 40, "text": "new"})))
        .await;

    assert_silent(&mut ana_rx).await;
    assert_eq!(ctx.messages.find(40).await.expect("kept").body, "old");
}

#[tokio::test]
async fn author_can_delete_own_message_without_audit() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;
    let (_bo, mut bo_rx) = ctx.join("bo-token", conversation()).await;

    ana.process(&frame("new_message", json!({"text": "oops"}))).await;
    let id = next_frame(&mut ana_rx).await["payload"]["id"].clone();
    next_frame(&mut bo_rx).await;

    ana.process(&frame("delete_message", json!({"id": id}))).await;

    for rx in [&mut ana_rx, &mut bo_rx] {
        assert_eq!(
            next_frame(rx).await,
            json!({
                "type": "message_soft_deleted",
                "payload": {"id": id, "original_author": ANA, "deleted_by": ANA}
            })
        );
    }

    let stored = ctx.messages.in_room(&conversation()).await;
    assert_eq!(stored.len(), 1, "deletion is never physical");
    assert_eq!(stored[0].state, MessageState::Deleted);
    assert_eq!(stored[0].body, "This message was deleted by ana.");
    assert_eq!(stored[0].deleted_by, Some(ANA));
    assert!(ctx.audit.entries().await.is_empty());
}

#[tokio::test]
async fn members_cannot_delete_other_messages() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;
    let (bo, mut bo_rx) = ctx.join("bo-token", conversation()).await;

    ana.process(&frame("new_message", json!({"text": "keep me"}))).await;
    let id = next_frame(&mut ana_rx).await["payload"]["id"].clone();
    next_frame(&mut bo_rx).await;

    bo.process(&frame("delete_message", json!({"id": id}))).await;

    assert_silent(&mut ana_rx).await;
    let stored = ctx.messages.in_room(&conversation()).await;
    assert_eq!(stored[0].state, MessageState::Sent);
}

#[tokio::test]
async fn moderator_deletes_are_audited() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;
    let (cy, mut cy_rx) = ctx.join("cy-token", conversation()).await;

    ana.process(&frame("new_message", json!({"text": "off topic"}))).await;
    let id = next_frame(&mut ana_rx).await["payload"]["id"].clone();
    next_frame(&mut cy_rx).await;

    cy.process(&frame("delete_message", json!({"id": id}))).await;

    let deleted = next_frame(&mut ana_rx).await;
    assert_eq!(deleted["payload"]["original_author"], ANA);
    assert_eq!(deleted["payload"]["deleted_by"], CY);

    let stored = ctx.messages.in_room(&conversation()).await;
    assert_eq!(stored[0].body, "This message was deleted by cy.");

    let entries = ctx.audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor, CY);
    assert_eq!(entries[0].action, AuditEntry::MESSAGE_DELETE);
    assert_eq!(entries[0].details["original_author"], ANA);
}

#[tokio::test]
async fn deleting_twice_broadcasts_once() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;

    ana.process(&frame("new_message", json!({"text": "bye"}))).await;
    let id = next_frame(&mut ana_rx).await["payload"]["id"].clone();

    ana.process(&frame("delete_message", json!({"id": id}))).await;
    assert_eq!(next_frame(&mut ana_rx).await["type"], "message_soft_deleted");

    ana.process(&frame("delete_message", json!({"id": id}))).await;
    ana.process(&frame("update_message", json!({"id": id, "text": "back"})))
        .await;
    assert_silent(&mut ana_rx).await;
}

#[tokio::test]
async fn persistence_failure_aborts_broadcast() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;
    let (_bo, mut bo_rx) = ctx.join("bo-token", conversation()).await;
    ctx.messages.fail_writes(true);

    let result = ana
        .handle_text(&frame("new_message", json!({"text": "lost"})))
        .await;
    assert!(matches!(result, Err(RealtimeError::Store(_))));

    assert_silent(&mut ana_rx).await;
    assert_silent(&mut bo_rx).await;

    ctx.messages.fail_writes(false);
    ana.process(&frame("new_message", json!({"text": "saved"}))).await;
    assert_eq!(next_frame(&mut bo_rx).await["payload"]["text"], "saved");
}

#[tokio::test]
async fn audit_failure_does_not_undo_delete() {
    let ctx = TestContext::new().await;
    ctx.audit.fail_writes(true);
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;
    let (cy, _cy_rx) = ctx.join("cy-token", conversation()).await;

    ana.process(&frame("new_message", json!({"text": "spam"}))).await;
    let id = next_frame(&mut ana_rx).await["payload"]["id"].clone();

    cy.process(&frame("delete_message", json!({"id": id}))).await;
    assert_eq!(next_frame(&mut ana_rx).await["type"], "message_soft_deleted");
}

fn session(user_id: i64, username: &str, access: RoomAccess) -> Session {
    Session {
        identity: Identity::new(user_id, username),
        room: conversation(),
        access,
    }
}

fn service(store: Arc<MemoryMessageStore>, window: Duration) -> MessageService {
    MessageService::new(
        store,
        Arc::new(MemoryAuditLog::new()),
        Arc::new(HtmlSanitizer),
        window,
    )
}

#[tokio::test]
async fn refusal_reasons_are_reported_to_callers() {
    let store = Arc::new(MemoryMessageStore::new());
    let messages = service(store.clone(), Duration::from_secs(900));
    let ana = session(ANA, "ana", RoomAccess::Member);
    let bo = session(BO, "bo", RoomAccess::Member);

    let view = messages.create(&ana, "first").await.expect("stored");

    assert_eq!(
        messages.update(&bo, view.id, "edit").await.expect("no error"),
        Outcome::Skipped(NoOp::NotAuthor)
    );
    assert_eq!(
        messages.update(&ana, 999, "edit").await.expect("no error"),
        Outcome::Skipped(NoOp::NotFound)
    );
    assert_eq!(
        messages.delete(&bo, view.id).await.expect("no error"),
        Outcome::Skipped(NoOp::NotAuthor)
    );

    assert!(messages.delete(&ana, view.id).await.expect("no error").is_applied());
    assert_eq!(
        messages.update(&ana, view.id, "edit").await.expect("no error"),
        Outcome::Skipped(NoOp::AlreadyDeleted)
    );
    assert_eq!(
        messages.delete(&ana, view.id).await.expect("no error"),
        Outcome::Skipped(NoOp::AlreadyDeleted)
    );
}

#[tokio::test]
async fn zero_edit_window_refuses_edits() {
    let store = Arc::new(MemoryMessageStore::new());
    let messages = service(store, Duration::ZERO);
    let ana = session(ANA, "ana", RoomAccess::Member);

    let view = messages.create(&ana, "typo").await.expect("stored");
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(
        messages.update(&ana, view.id, "fixed").await.expect("no error"),
        Outcome::Skipped(NoOp::EditWindowElapsed)
    );
}

#[tokio::test]
async fn oversized_messages_are_rejected() {
    let store = Arc::new(MemoryMessageStore::new());
    let messages = service(store.clone(), Duration::from_secs(900));
    let ana = session(ANA, "ana", RoomAccess::Member);

    let result = messages.create(&ana, &"a".repeat(10_001)).await;
    assert!(matches!(result, Err(RealtimeError::Validation { .. })));
    assert!(store.in_room(&conversation()).await.is_empty());
}

#[tokio::test]
async fn length_limit_counts_text_before_escaping() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;

    ana.handle_text(&frame("new_message", json!({ "text": "<".repeat(3_000) })))
        .await
        .expect("short escape-heavy message accepted");

    let received = next_frame(&mut ana_rx).await;
    assert_eq!(received["payload"]["text"], "&lt;".repeat(3_000));

    let too_long = ana
        .handle_text(&frame(
            "new_message",
            json!({ "text": format!("  {}  ", "'".repeat(10_001)) }),
        ))
        .await;
    assert!(matches!(too_long, Err(RealtimeError::Validation { .. })));

    let padded = ana
        .handle_text(&frame(
            "new_message",
            json!({ "text": format!("  {}  ", "x".repeat(10_000)) }),
        ))
        .await;
    assert!(padded.is_ok(), "surrounding whitespace does not count");
    assert_eq!(ctx.messages.in_room(&conversation()).await.len(), 2);
}

#[tokio::test]
async fn chat_text_is_trimmed_before_storage() {
    let ctx = TestContext::new().await;
    let (ana, mut ana_rx) = ctx.join("ana-token", conversation()).await;

    ana.handle_text(&frame("new_message", json!({ "text": "\n  hi there \t" })))
        .await
        .expect("message accepted");
    assert_eq!(next_frame(&mut ana_rx).await["payload"]["text"], "hi there");

    let control_only = ana
        .handle_text(&frame("new_message", json!({ "text": "\u{0007}" })))
        .await;
    assert!(matches!(control_only, Err(RealtimeError::Validation { .. })));
}
