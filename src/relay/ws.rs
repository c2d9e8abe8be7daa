use axum::{
    debug_handler,
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::relay::event::{ClientEvent, ServerEvent};
use crate::relay::{ConnId, Registry, RelayError, join, msg};

#[debug_handler(state = crate::AppState)]
pub async fn chat_ws(
    State(db_pool): State<SqlitePool>,
    State(registry): State<Registry>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, db_pool, registry))
}

/// One reader and one writer task per socket; outbound frames travel through
/// the registry's mpsc sender so broadcasts never contend on the sink.
async fn handle_socket(socket: WebSocket, db_pool: SqlitePool, registry: Registry) {
    let conn_id = Uuid::now_v7();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.attach(conn_id, tx).await;
    log::info!("connection {conn_id} accepted");

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        let Ok(event) = serde_json::from_slice::<ClientEvent>(&message.into_data()) else {
            continue;
        };
        // failures stay on this side of the wire: log and keep serving
        if let Err(err) = dispatch(&db_pool, &registry, conn_id, event).await {
            log::warn!("connection {conn_id}: {err}");
        }
    }

    handle_disconnect(&db_pool, &registry, conn_id).await;
    writer.abort();
    log::info!("connection {conn_id} closed");
}

pub async fn dispatch(
    db_pool: &SqlitePool,
    registry: &Registry,
    conn_id: ConnId,
    event: ClientEvent,
) -> Result<(), RelayError> {
    match event {
        ClientEvent::JoinRoom(payload) => {
            join::handle_join(db_pool, registry, conn_id, payload).await
        }
        ClientEvent::SendMessage(payload) => msg::handle_send(db_pool, registry, payload).await,
    }
}

/// Tears down a connection. Unknown connection ids are a silent no-op, so a
/// close racing a failed join (or a repeated close) does nothing. The
/// offline broadcast is room-scoped, unlike the global fan-out on join.
pub async fn handle_disconnect(db_pool: &SqlitePool, registry: &Registry, conn_id: ConnId) {
    let Some(entry) = registry.detach(conn_id).await else {
        return;
    };

    let now = OffsetDateTime::now_utc();
    if let Err(err) = crate::relay::presence::mark_offline(db_pool, entry.user_id, now).await {
        log::error!("marking user {} offline failed: {err}", entry.user_id);
    }

    registry
        .broadcast_room(&entry.room_id, &ServerEvent::UserOffline(entry.user_id))
        .await;
}
