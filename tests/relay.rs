use axum::extract::ws::Message;
use pairchat::db::testing::{memory_pool, seed_user};
use pairchat::relay::{
    self, JoinRoom, Registry, SendMessage, ServerEvent, handle_disconnect, handle_join,
    handle_send,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use uuid::Uuid;

async fn attached(registry: &Registry) -> (Uuid, UnboundedReceiver<Message>) {
    let conn_id = Uuid::now_v7();
    let (tx, rx) = mpsc::unbounded_channel();
    registry.attach(conn_id, tx).await;
    (conn_id, rx)
}

fn next_event(rx: &mut UnboundedReceiver<Message>) -> ServerEvent {
    let Message::Text(text) = rx.try_recv().expect("expected a pending frame") else {
        panic!("expected a text frame");
    };
    serde_json::from_str(&text).unwrap()
}

fn send(room_id: &str, sender_id: i64, receiver_id: i64, message: &str) -> SendMessage {
    SendMessage {
        room_id: room_id.to_owned(),
        sender_id,
        receiver_id,
        message: message.to_owned(),
    }
}

#[tokio::test]
async fn sent_message_shows_up_in_join_history() {
    let db_pool = memory_pool().await;
    seed_user(&db_pool, 1, "ayse").await;
    seed_user(&db_pool, 2, "mehmet").await;
    let registry = Registry::new();

    handle_send(&db_pool, &registry, send("1-2", 1, 2, "hello"))
        .await
        .unwrap();

    let (conn_id, mut rx) = attached(&registry).await;
    let join = JoinRoom { room_id: "1-2".to_owned(), user_id: 1 };
    handle_join(&db_pool, &registry, conn_id, join).await.unwrap();

    let ServerEvent::UserOnline(active) = next_event(&mut rx) else {
        panic!("expected userOnline first");
    };
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, 1);

    let ServerEvent::PreviousMessages(messages) = next_event(&mut rx) else {
        panic!("expected previousMessages");
    };
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message, "hello");
    assert_eq!(messages[0].sender_id, 1);
    assert_eq!(messages[0].receiver_id, 2);
}

#[tokio::test]
async fn relayed_message_reaches_the_whole_room_including_the_sender() {
    let db_pool = memory_pool().await;
    seed_user(&db_pool, 1, "ayse").await;
    seed_user(&db_pool, 2, "mehmet").await;
    let registry = Registry::new();

    let (conn_a, mut rx_a) = attached(&registry).await;
    let (conn_b, mut rx_b) = attached(&registry).await;
    let (_other, mut rx_other) = attached(&registry).await;

    let join = JoinRoom { room_id: "1-2".to_owned(), user_id: 1 };
    handle_join(&db_pool, &registry, conn_a, join).await.unwrap();
    let join = JoinRoom { room_id: "1-2".to_owned(), user_id: 2 };
    handle_join(&db_pool, &registry, conn_b, join).await.unwrap();
    while rx_a.try_recv().is_ok() {}
    while rx_b.try_recv().is_ok() {}
    while rx_other.try_recv().is_ok() {}

    handle_send(&db_pool, &registry, send("1-2", 1, 2, "selam"))
        .await
        .unwrap();

    for rx in [&mut rx_a, &mut rx_b] {
        let ServerEvent::ReceiveMessage(message) = next_event(rx) else {
            panic!("expected receiveMessage");
        };
        assert_eq!(message.message, "selam");
        assert_eq!(
            message.sender.profile_image.as_deref(),
            Some("/avatars/ayse.png")
        );
    }
    // no leak outside the room
    assert!(rx_other.try_recv().is_err());
}

#[tokio::test]
async fn join_send_disconnect_scenario_for_pair_3_5() {
    let db_pool = memory_pool().await;
    seed_user(&db_pool, 3, "mehmet").await;
    seed_user(&db_pool, 5, "ayse").await;
    let registry = Registry::new();

    handle_send(&db_pool, &registry, send("3-5", 3, 5, "nasilsin"))
        .await
        .unwrap();
    handle_send(&db_pool, &registry, send("3-5", 5, 3, "iyiyim"))
        .await
        .unwrap();

    let (conn_id, mut rx) = attached(&registry).await;
    let join = JoinRoom { room_id: "3-5".to_owned(), user_id: 5 };
    handle_join(&db_pool, &registry, conn_id, join).await.unwrap();

    let ServerEvent::UserOnline(_) = next_event(&mut rx) else {
        panic!("expected userOnline");
    };
    let ServerEvent::PreviousMessages(messages) = next_event(&mut rx) else {
        panic!("expected previousMessages");
    };
    // both directions of the pair, creation order
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message, "nasilsin");
    assert_eq!(messages[1].message, "iyiyim");

    handle_disconnect(&db_pool, &registry, conn_id).await;

    let active = relay::presence::active_peers(&db_pool, 3, 5).await.unwrap();
    assert!(active.is_empty());
    let (online, last_seen): (bool, Option<String>) =
        sqlx::query_as("SELECT online,last_seen FROM users WHERE id=5")
            .fetch_one(&db_pool)
            .await
            .unwrap();
    assert!(!online);
    assert!(last_seen.is_some());
}
