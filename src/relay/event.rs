use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db::User;

/// Inbound events, tagged on the `event` field:
/// `{"event":"joinRoom","roomId":"1-2","userId":1}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event")]
pub enum ClientEvent {
    #[serde(rename = "joinRoom")]
    JoinRoom(JoinRoom),
    #[serde(rename = "sendMessage")]
    SendMessage(SendMessage),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room_id: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub room_id: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub message: String,
}

/// Outbound events as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Conversation history, sent to the joining connection only.
    #[serde(rename = "previousMessages")]
    PreviousMessages(Vec<MessageRecord>),
    /// Active-peer snapshot, fanned out to every connection.
    #[serde(rename = "userOnline")]
    UserOnline(Vec<User>),
    /// A freshly persisted message, fanned out to its room.
    #[serde(rename = "receiveMessage")]
    ReceiveMessage(MessageRecord),
    /// The id of a user whose connection in this room went away.
    #[serde(rename = "userOffline")]
    UserOffline(i64),
}

/// A persisted message joined with both participants' profile images, so
/// the client can render it without a second round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub message: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub sender: ProfileRef,
    pub receiver: ProfileRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRef {
    #[serde(rename = "profileImage")]
    pub profile_image: Option<String>,
}
