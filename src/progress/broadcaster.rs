/*!
 * Per-user push fan-out.
 *
 * The broadcaster keeps one registry entry per live client connection,
 * keyed by user. Sends never block and never fail the caller: a connection
 * whose channel is gone is removed on the spot — sender and metadata leave
 * the registry together, so nothing leaks on disconnect.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::progress::messages::{CONNECTION_TIMEOUT_SECS, NotificationMessage};

/// Bookkeeping for one live client connection
struct ConnectionInfo {
    sender: mpsc::UnboundedSender<NotificationMessage>,
    connected_at: Instant,
    last_seen: Instant,
}

/// Fans notification messages out to every live connection of a user
pub struct ProgressBroadcaster {
    connections: Arc<RwLock<HashMap<String, HashMap<String, ConnectionInfo>>>>,
}

impl ProgressBroadcaster {
    /// Create an empty broadcaster
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new connection for a user.
    ///
    /// Returns the connection id and the receiving end of the push channel.
    pub fn subscribe(
        &self,
        user_id: &str,
    ) -> (String, mpsc::UnboundedReceiver<NotificationMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut connections = self.connections.write();
        connections.entry(user_id.to_string()).or_default().insert(
            connection_id.clone(),
            ConnectionInfo { sender: tx, connected_at: now, last_seen: now },
        );

        info!("Client connected for user {} ({} connection(s))", user_id,
              connections.get(user_id).map(HashMap::len).unwrap_or(0));

        (connection_id, rx)
    }

    /// Remove a connection and its metadata in one step
    pub fn unsubscribe(&self, user_id: &str, connection_id: &str) {
        let mut connections = self.connections.write();
        if let Some(user_connections) = connections.get_mut(user_id) {
            user_connections.remove(connection_id);
            if user_connections.is_empty() {
                connections.remove(user_id);
            }
        }
        debug!("Client {} disconnected for user {}", connection_id, user_id);
    }

    /// Send a message to every live connection of one user.
    ///
    /// A dead connection is dropped from the registry; the remaining
    /// recipients still get the message and the caller never sees an error.
    pub fn send_to_user(&self, user_id: &str, message: &NotificationMessage) {
        let mut dead = Vec::new();

        {
            let connections = self.connections.read();
            let Some(user_connections) = connections.get(user_id) else {
                return;
            };

            for (connection_id, info) in user_connections {
                if info.sender.send(message.clone()).is_err() {
                    dead.push(connection_id.clone());
                }
            }
        }

        if !dead.is_empty() {
            warn!(
                "Dropping {} dead connection(s) for user {}",
                dead.len(),
                user_id
            );
            for connection_id in dead {
                self.unsubscribe(user_id, &connection_id);
            }
        }
    }

    /// Send a heartbeat to every connection of every user
    pub fn broadcast_heartbeat(&self) {
        let users: Vec<String> = self.connections.read().keys().cloned().collect();
        let message = NotificationMessage::heartbeat();
        for user_id in users {
            self.send_to_user(&user_id, &message);
        }
    }

    /// Record a client pong, refreshing its liveness deadline
    pub fn record_pong(&self, user_id: &str, connection_id: &str) {
        let mut connections = self.connections.write();
        if let Some(info) = connections
            .get_mut(user_id)
            .and_then(|m| m.get_mut(connection_id))
        {
            info.last_seen = Instant::now();
        }
    }

    /// Drop every connection silent for longer than the timeout.
    ///
    /// Returns the number of pruned connections.
    pub fn prune_dead(&self) -> usize {
        self.prune_older_than(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
    }

    /// Drop connections whose last sign of life is older than `max_silence`
    pub fn prune_older_than(&self, max_silence: Duration) -> usize {
        let now = Instant::now();
        let mut pruned = 0;

        let mut connections = self.connections.write();
        for user_connections in connections.values_mut() {
            let before = user_connections.len();
            user_connections
                .retain(|_, info| now.duration_since(info.last_seen) <= max_silence);
            pruned += before - user_connections.len();
        }
        connections.retain(|_, m| !m.is_empty());

        if pruned > 0 {
            info!("Pruned {} dead connection(s)", pruned);
        }
        pruned
    }

    /// Number of live connections for one user
    pub fn connection_count(&self, user_id: &str) -> usize {
        self.connections
            .read()
            .get(user_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Number of live connections across all users
    pub fn total_connections(&self) -> usize {
        self.connections.read().values().map(HashMap::len).sum()
    }

    /// How long a connection has been registered, if it exists
    pub fn connection_age(&self, user_id: &str, connection_id: &str) -> Option<Duration> {
        self.connections
            .read()
            .get(user_id)
            .and_then(|m| m.get(connection_id))
            .map(|info| info.connected_at.elapsed())
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ProgressBroadcaster {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::tracker::TaskStatus;

    #[tokio::test]
    async fn test_subscribe_shouldDeliverMessages() {
        let broadcaster = ProgressBroadcaster::new();
        let (_, mut rx) = broadcaster.subscribe("user-1");

        broadcaster.send_to_user("user-1", &NotificationMessage::progress("t", 10, TaskStatus::Processing));

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, NotificationMessage::Progress { progress: 10, .. }));
    }

    #[tokio::test]
    async fn test_sendToUser_otherUser_shouldNotReceive() {
        let broadcaster = ProgressBroadcaster::new();
        let (_, mut rx) = broadcaster.subscribe("user-2");

        broadcaster.send_to_user("user-1", &NotificationMessage::heartbeat());

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sendToUser_multipleConnections_shouldFanOut() {
        let broadcaster = ProgressBroadcaster::new();
        let (_, mut rx1) = broadcaster.subscribe("user-1");
        let (_, mut rx2) = broadcaster.subscribe("user-1");

        broadcaster.send_to_user("user-1", &NotificationMessage::heartbeat());

        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_sendToUser_oneDeadConnection_shouldStillDeliverToOthers() {
        let broadcaster = ProgressBroadcaster::new();
        let (_, rx_dead) = broadcaster.subscribe("user-1");
        let (_, mut rx_live) = broadcaster.subscribe("user-1");
        drop(rx_dead);

        broadcaster.send_to_user("user-1", &NotificationMessage::heartbeat());

        assert!(rx_live.recv().await.is_some());
        // the dead connection was removed together with its metadata
        assert_eq!(broadcaster.connection_count("user-1"), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_shouldRemoveMembershipAndMetadata() {
        let broadcaster = ProgressBroadcaster::new();
        let (connection_id, _rx) = broadcaster.subscribe("user-1");

        assert!(broadcaster.connection_age("user-1", &connection_id).is_some());
        broadcaster.unsubscribe("user-1", &connection_id);

        assert_eq!(broadcaster.connection_count("user-1"), 0);
        assert!(broadcaster.connection_age("user-1", &connection_id).is_none());
        assert_eq!(broadcaster.total_connections(), 0);
    }

    #[tokio::test]
    async fn test_broadcastHeartbeat_shouldReachAllUsers() {
        let broadcaster = ProgressBroadcaster::new();
        let (_, mut rx1) = broadcaster.subscribe("user-1");
        let (_, mut rx2) = broadcaster.subscribe("user-2");

        broadcaster.broadcast_heartbeat();

        assert!(matches!(rx1.recv().await.unwrap(), NotificationMessage::Heartbeat { .. }));
        assert!(matches!(rx2.recv().await.unwrap(), NotificationMessage::Heartbeat { .. }));
    }

    #[tokio::test]
    async fn test_pruneOlderThan_silentConnection_shouldBeDropped() {
        let broadcaster = ProgressBroadcaster::new();
        let (_, _rx) = broadcaster.subscribe("user-1");

        // zero tolerance prunes everything not refreshed this instant
        let pruned = broadcaster.prune_older_than(Duration::ZERO);

        assert_eq!(pruned, 1);
        assert_eq!(broadcaster.total_connections(), 0);
    }

    #[tokio::test]
    async fn test_recordPong_shouldKeepConnectionAlive() {
        let broadcaster = ProgressBroadcaster::new();
        let (connection_id, _rx) = broadcaster.subscribe("user-1");

        broadcaster.record_pong("user-1", &connection_id);
        let pruned = broadcaster.prune_older_than(Duration::from_secs(60));

        assert_eq!(pruned, 0);
        assert_eq!(broadcaster.connection_count("user-1"), 1);
    }
}
