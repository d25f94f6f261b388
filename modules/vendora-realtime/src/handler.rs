//! WebSocket upgrade handler and per-connection message loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vendora_common::Identity;

use crate::auth::extract_token;
use crate::channel::RealtimeChannel;
use crate::message::{ClientMessage, ServerMessage};

const SEND_QUEUE_SIZE: usize = 64;
const INBOUND_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Upgrade handler. Authentication happens before the upgrade — an
/// unauthenticated connection is refused, not silently degraded.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(channel): State<Arc<RealtimeChannel>>,
) -> Response {
    let token = match extract_token(&headers, query.token.as_deref()) {
        Some(token) => token,
        None => return StatusCode::UNAUTHORIZED.into_response(),
    };
    let identity = match channel.jwt().verify_token(&token) {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "websocket auth failed");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, identity, channel))
}

/// Sliding-window check on inbound client messages. Local to the
/// connection — this guards the channel layer itself, independent of the
/// pipeline's rate limiter.
fn allow_inbound(entries: &mut Vec<Instant>, now: Instant, max: usize) -> bool {
    if let Some(cutoff) = now.checked_sub(INBOUND_WINDOW) {
        entries.retain(|t| *t > cutoff);
    }
    if entries.len() >= max {
        return false;
    }
    entries.push(now);
    true
}

async fn handle_socket(socket: WebSocket, identity: Identity, channel: Arc<RealtimeChannel>) {
    let user_id = identity.user_id;
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(SEND_QUEUE_SIZE);
    // Keep a direct handle for replies to this connection only; the
    // registry copy serves fan-out publishes.
    let direct = tx.clone();
    let conn_id = channel.registry().register(user_id, tx);
    info!(%conn_id, %user_id, "websocket connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward queued server messages to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to serialize server message");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let _ = direct.send(ServerMessage::Connected { user_id }).await;

    let mut inbound_window: Vec<Instant> = Vec::new();
    let inbound_max = channel.inbound_max_per_minute();

    while let Some(result) = ws_receiver.next().await {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                debug!(%conn_id, error = %e, "websocket receive error");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                if !allow_inbound(&mut inbound_window, Instant::now(), inbound_max) {
                    warn!(%conn_id, %user_id, "inbound flood, closing connection");
                    break;
                }
                handle_client_message(&text, &direct).await;
            }
            Message::Close(_) => break,
            // Pings/pongs are handled by the transport.
            _ => {}
        }
    }

    channel.registry().unregister(user_id, conn_id);
    send_task.abort();
    info!(%conn_id, %user_id, "websocket disconnected");
}

async fn handle_client_message(text: &str, direct: &mpsc::Sender<ServerMessage>) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => ServerMessage::Pong,
        Err(_) => ServerMessage::Error {
            message: "unrecognized message".to_string(),
        },
    };
    let _ = direct.send(reply).await;
}
