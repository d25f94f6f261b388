//! Authenticated real-time push channel.
//!
//! Connections authenticate with the same bearer token the REST layer
//! issues; `(identity, role)` rides on the connection. Delivery is
//! at-most-once and best-effort — the store channel is the durable record.

pub mod auth;
pub mod channel;
pub mod connection;
pub mod handler;
pub mod message;

pub use auth::{extract_token, Claims, JwtService};
pub use channel::{PublishResult, RealtimeChannel};
pub use connection::{ConnectionId, ConnectionRegistry};
pub use handler::{ws_handler, WsQuery};
pub use message::{ClientMessage, ServerMessage};
