use sqlx::SqlitePool;

use crate::relay::event::{JoinRoom, ServerEvent};
use crate::relay::{ConnId, Registry, RelayError, msg, presence, room};

/// Joins a connection to a conversation. The room id is resolved before the
/// registry is touched, so a malformed id never leaves a half-registered
/// connection behind. Presence fan-out is deliberately global: any connected
/// client may be showing this user's presence badge. History delivery is
/// best effort; a store failure there is logged and the join still stands.
pub async fn handle_join(
    db_pool: &SqlitePool,
    registry: &Registry,
    conn_id: ConnId,
    join: JoinRoom,
) -> Result<(), RelayError> {
    let (user_a, user_b) = room::resolve(&join.room_id)?;

    registry.join(conn_id, join.user_id, join.room_id.clone()).await;

    presence::mark_online(db_pool, join.user_id).await?;
    let active = presence::active_peers(db_pool, user_a, user_b).await?;
    registry.broadcast_all(&ServerEvent::UserOnline(active)).await;

    match msg::history(db_pool, user_a, user_b).await {
        Ok(messages) => {
            registry
                .send_to(conn_id, &ServerEvent::PreviousMessages(messages))
                .await;
        }
        Err(err) => {
            log::error!("history fetch for room {} failed: {err}", join.room_id);
        }
    }

    Ok(())
}
