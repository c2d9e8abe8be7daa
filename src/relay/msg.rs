use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::relay::event::{MessageRecord, ProfileRef, SendMessage, ServerEvent};
use crate::relay::{Registry, RelayError};

type MessageRow = (i64, String, i64, i64, OffsetDateTime, Option<String>, Option<String>);

fn record(row: MessageRow) -> MessageRecord {
    let (id, message, sender_id, receiver_id, created_at, sender_image, receiver_image) = row;
    MessageRecord {
        id,
        message,
        sender_id,
        receiver_id,
        created_at,
        sender: ProfileRef { profile_image: sender_image },
        receiver: ProfileRef { profile_image: receiver_image },
    }
}

/// Persists an inbound message and relays it to every connection in the
/// room, the sender's own included. Fire and forget: the sender gets no
/// acknowledgment beyond seeing its own message come back.
pub async fn handle_send(
    db_pool: &SqlitePool,
    registry: &Registry,
    send: SendMessage,
) -> Result<(), RelayError> {
    if send.message.is_empty() {
        return Err(RelayError::InvalidMessage);
    }
    for user_id in [send.sender_id, send.receiver_id] {
        if sqlx::query("SELECT 1 FROM users WHERE id=?")
            .bind(user_id)
            .fetch_optional(db_pool)
            .await?
            .is_none()
        {
            return Err(RelayError::UnknownUser(user_id));
        }
    }

    let inserted = sqlx::query(
        "INSERT INTO messages (message,sender_id,receiver_id,createdAt) VALUES (?,?,?,?)",
    )
    .bind(&send.message)
    .bind(send.sender_id)
    .bind(send.receiver_id)
    .bind(OffsetDateTime::now_utc())
    .execute(db_pool)
    .await?;

    // re-read joined with the profile images the client renders
    let detailed = fetch_message(db_pool, inserted.last_insert_rowid())
        .await?
        .ok_or(RelayError::Store(sqlx::Error::RowNotFound))?;

    registry
        .broadcast_room(&send.room_id, &ServerEvent::ReceiveMessage(detailed))
        .await;
    Ok(())
}

pub async fn fetch_message(
    db_pool: &SqlitePool,
    id: i64,
) -> Result<Option<MessageRecord>, RelayError> {
    let row: Option<MessageRow> = sqlx::query_as(
        "SELECT m.id,m.message,m.sender_id,m.receiver_id,m.createdAt,
                s.profileImage,r.profileImage
         FROM messages m
         JOIN users s ON s.id=m.sender_id
         JOIN users r ON r.id=m.receiver_id
         WHERE m.id=?",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?;
    Ok(row.map(record))
}

/// Every message exchanged between a pair, in both directions, creation
/// order ascending.
pub async fn history(
    db_pool: &SqlitePool,
    user_a: i64,
    user_b: i64,
) -> Result<Vec<MessageRecord>, RelayError> {
    let rows: Vec<MessageRow> = sqlx::query_as(
        "SELECT m.id,m.message,m.sender_id,m.receiver_id,m.createdAt,
                s.profileImage,r.profileImage
         FROM messages m
         JOIN users s ON s.id=m.sender_id
         JOIN users r ON r.id=m.receiver_id
         WHERE (m.sender_id=? AND m.receiver_id=?)
            OR (m.sender_id=? AND m.receiver_id=?)
         ORDER BY m.id",
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .fetch_all(db_pool)
    .await?;
    Ok(rows.into_iter().map(record).collect())
}
