use axum::{
    Json, debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::{AppResult, db::User};

#[derive(Debug, Deserialize)]
pub struct FriendsQuery {
    pub username: String,
}

/// A friendship edge joined with the friend's full profile projection.
#[derive(Debug, Serialize)]
pub struct FriendEdge {
    pub id: i64,
    pub user_id: i64,
    pub friend_id: i64,
    pub friend: User,
}

#[debug_handler]
pub async fn friends(
    State(db_pool): State<SqlitePool>,
    Json(FriendsQuery { username }): Json<FriendsQuery>,
) -> AppResult<Response> {
    let Some((user_id,)): Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE username=?")
            .bind(&username)
            .fetch_optional(&db_pool)
            .await?
    else {
        // original behavior: unknown usernames answer 500 with an error body
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "check the username"})),
        )
            .into_response());
    };

    type FriendRow = (
        i64,
        i64,
        i64,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        bool,
        Option<OffsetDateTime>,
    );
    let rows: Vec<FriendRow> = sqlx::query_as(
        "SELECT f.id,f.user_id,f.friend_id,
                u.name,u.surname,u.username,u.profileImage,u.online,u.last_seen
         FROM friends f
         JOIN users u ON u.id=f.friend_id
         WHERE f.user_id=?",
    )
    .bind(user_id)
    .fetch_all(&db_pool)
    .await?;

    let friends: Vec<FriendEdge> = rows
        .into_iter()
        .map(
            |(id, user_id, friend_id, name, surname, username, profile_image, online, last_seen)| {
                FriendEdge {
                    id,
                    user_id,
                    friend_id,
                    friend: User {
                        id: friend_id,
                        name,
                        surname,
                        username,
                        profile_image,
                        online,
                        last_seen,
                    },
                }
            },
        )
        .collect();

    Ok(Json(json!({
        "user_id": user_id,
        "friends": friends,
    }))
    .into_response())
}
