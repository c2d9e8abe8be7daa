use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::db::User;
use crate::relay::RelayError;

/// Flags a user as online. Idempotent, and never touches `last_seen`.
/// An unknown user id is skipped silently: presence is best effort and must
/// not block history delivery on join.
pub async fn mark_online(db_pool: &SqlitePool, user_id: i64) -> Result<(), RelayError> {
    sqlx::query("UPDATE users SET online=1 WHERE id=?")
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn mark_offline(
    db_pool: &SqlitePool,
    user_id: i64,
    at: OffsetDateTime,
) -> Result<(), RelayError> {
    sqlx::query("UPDATE users SET online=0, last_seen=? WHERE id=?")
        .bind(at)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// The online subset of a conversation pair, with full profile projection.
pub async fn active_peers(
    db_pool: &SqlitePool,
    user_a: i64,
    user_b: i64,
) -> Result<Vec<User>, RelayError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id,name,surname,username,profileImage,online,last_seen
         FROM users WHERE id IN (?,?) AND online=1",
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_all(db_pool)
    .await?;
    Ok(users)
}
