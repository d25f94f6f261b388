//! Connection registry. Keyed by user id — one user may hold several live
//! connections (multiple tabs/devices) and a publish reaches all of them.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::message::ServerMessage;

/// Unique id per websocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<ServerMessage>,
}

/// All live connections, sharded by user id so concurrent traffic for
/// different users never contends on one lock.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, Vec<ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, user_id: Uuid, sender: mpsc::Sender<ServerMessage>) -> ConnectionId {
        let id = ConnectionId::generate();
        self.connections
            .entry(user_id)
            .or_default()
            .push(ConnectionHandle { id, sender });
        id
    }

    pub fn unregister(&self, user_id: Uuid, id: ConnectionId) {
        if let Some(mut handles) = self.connections.get_mut(&user_id) {
            handles.retain(|h| h.id != id);
        }
        self.connections
            .remove_if(&user_id, |_, handles| handles.is_empty());
    }

    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(|e| e.value().len()).sum()
    }

    pub fn has_connections(&self, user_id: Uuid) -> bool {
        self.connections
            .get(&user_id)
            .is_some_and(|h| !h.is_empty())
    }

    /// Send to every live connection of `user_id`. Returns how many
    /// connections accepted the message.
    pub async fn send_to_user(&self, user_id: Uuid, message: ServerMessage) -> usize {
        // Clone the senders out so the dashmap shard lock is not held
        // across awaits.
        let senders: Vec<mpsc::Sender<ServerMessage>> = match self.connections.get(&user_id) {
            Some(handles) => handles.iter().map(|h| h.sender.clone()).collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for sender in senders {
            if sender.send(message.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::generate(), ConnectionId::generate());
    }

    #[tokio::test]
    async fn register_and_unregister() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(4);

        let id = registry.register(user, tx);
        assert_eq!(registry.connection_count(), 1);
        assert!(registry.has_connections(user));

        registry.unregister(user, id);
        assert_eq!(registry.connection_count(), 0);
        assert!(!registry.has_connections(user));
    }

    #[tokio::test]
    async fn send_reaches_every_connection_of_the_user() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        registry.register(user, tx1);
        registry.register(user, tx2);

        let delivered = registry.send_to_user(user, ServerMessage::Pong).await;
        assert_eq!(delivered, 2);
        assert!(matches!(rx1.recv().await, Some(ServerMessage::Pong)));
        assert!(matches!(rx2.recv().await, Some(ServerMessage::Pong)));
    }

    #[tokio::test]
    async fn send_to_unknown_user_reaches_nobody() {
        let registry = ConnectionRegistry::new();
        let delivered = registry
            .send_to_user(Uuid::new_v4(), ServerMessage::Pong)
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn other_users_are_not_disturbed() {
        let registry = ConnectionRegistry::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        registry.register(alice, tx_a);
        registry.register(bob, tx_b);

        registry.send_to_user(alice, ServerMessage::Pong).await;
        assert!(matches!(rx_a.recv().await, Some(ServerMessage::Pong)));
        assert!(rx_b.try_recv().is_err());
    }
}
