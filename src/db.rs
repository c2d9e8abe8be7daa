use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use time::OffsetDateTime;

/// Profile row as persisted and as sent on the wire. `last_seen` is null for
/// a user that is currently online or has never been seen disconnecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub username: Option<String>,
    #[sqlx(rename = "profileImage")]
    #[serde(rename = "profileImage")]
    pub profile_image: Option<String>,
    pub online: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_seen: Option<OffsetDateTime>,
}

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        surname TEXT,
        username TEXT,
        profileImage TEXT,
        online INTEGER NOT NULL DEFAULT 0,
        last_seen TEXT
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        message TEXT NOT NULL CHECK (message <> ''),
        sender_id INTEGER NOT NULL REFERENCES users(id),
        receiver_id INTEGER NOT NULL REFERENCES users(id),
        createdAt TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS friends (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        friend_id INTEGER NOT NULL REFERENCES users(id)
    )",
];

pub async fn connect(url: &str) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect_with(options)
        .await?;

    init_schema(&db_pool).await?;
    Ok(db_pool)
}

pub async fn init_schema(db_pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(db_pool).await?;
    }
    Ok(())
}

/// Support for exercising the relay against a throwaway database.
pub mod testing {
    use super::*;

    /// A single-connection in-memory pool; sqlite gives every connection its
    /// own `:memory:` database, so the pool must not grow past one.
    pub async fn memory_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        init_schema(&db_pool).await.unwrap();
        db_pool
    }

    pub async fn seed_user(db_pool: &SqlitePool, id: i64, username: &str) {
        sqlx::query(
            "INSERT INTO users (id,name,surname,username,profileImage,online)
             VALUES (?,?,?,?,?,0)",
        )
        .bind(id)
        .bind(format!("name-{username}"))
        .bind(format!("surname-{username}"))
        .bind(username)
        .bind(format!("/avatars/{username}.png"))
        .execute(db_pool)
        .await
        .unwrap();
    }
}
