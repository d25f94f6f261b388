use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendora_common::Notification;

/// Messages pushed to a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after a successful upgrade.
    Connected { user_id: Uuid },
    Notification { notification: Notification },
    Pong,
    Error { message: String },
}

/// Messages a client may send. Anything else gets an `Error` back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}
