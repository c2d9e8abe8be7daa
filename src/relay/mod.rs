mod event;
mod join;
mod msg;
mod registry;
mod ws;

pub mod presence;
pub mod room;

pub use event::{ClientEvent, JoinRoom, MessageRecord, ProfileRef, SendMessage, ServerEvent};
pub use join::handle_join;
pub use msg::{fetch_message, handle_send, history};
pub use registry::{ConnId, ConnectionEntry, Registry};
pub use ws::{chat_ws, dispatch, handle_disconnect};

use thiserror::Error;

/// Everything that can go wrong while handling a relay event. Failures are
/// caught at the socket read loop and logged; none of them tear down the
/// connection or the process.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("malformed room id {0:?}")]
    MalformedRoomId(String),
    #[error("message body must not be empty")]
    InvalidMessage,
    #[error("user {0} does not exist")]
    UnknownUser(i64),
    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),
}
