use std::sync::Arc;
use std::time::Duration;

use huddle_realtime::repositories::memory::MemoryNotifications;
use huddle_realtime::{NotificationPayload, NotificationService, NotificationSink, UserChannels};

fn payload(text: &str) -> NotificationPayload {
    NotificationPayload::new(text, "http://localhost:5173/conversations/1")
}

#[tokio::test]
async fn live_streams_receive_published_notifications() {
    let channels = UserChannels::new(8);
    let mut first = channels.subscribe(7);
    let mut second = channels.subscribe(7);

    assert_eq!(channels.publish(7, payload("ping")), 2);
    assert_eq!(first.recv().await, Some(payload("ping")));
    assert_eq!(second.recv().await, Some(payload("ping")));
}

#[tokio::test]
async fn channel_is_dropped_with_last_stream() {
    let channels = UserChannels::new(8);
    let first = channels.subscribe(7);
    let second = channels.subscribe(7);
    assert_eq!(channels.online_users(), 1);

    drop(first);
    assert!(channels.is_online(7));

    drop(second);
    assert!(!channels.is_online(7));
    assert_eq!(channels.publish(7, payload("nobody home")), 0);
}

#[tokio::test]
async fn notifications_are_persisted_and_pushed() {
    let channels = UserChannels::new(8);
    let durable = Arc::new(MemoryNotifications::new());
    let service = NotificationService::new(channels.clone(), durable.clone());
    let mut stream = channels.subscribe(3);

    service
        .notify(3, payload("you were mentioned"))
        .await
        .expect("persisted");
    service
        .notify(4, payload("offline user"))
        .await
        .expect("persisted");

    let received = tokio::time::timeout(Duration::from_secs(1), stream.recv())
        .await
        .expect("delivered in time");
    assert_eq!(received, Some(payload("you were mentioned")));

    let stored = durable.delivered().await;
    assert_eq!(
        stored,
        vec![
            (3, payload("you were mentioned")),
            (4, payload("offline user"))
        ]
    );
}

#[tokio::test]
async fn lagging_stream_skips_ahead() {
    let channels = UserChannels::new(2);
    let mut stream = channels.subscribe(1);

    for n in 0..5 {
        channels.publish(1, payload(&format!("n{n}")));
    }

    assert_eq!(stream.recv().await, Some(payload("n3")));
    assert_eq!(stream.recv().await, Some(payload("n4")));
}
