//! In-process connection hub backing the WebSocket transport

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::game::SessionId;

use super::protocol::ServerMsg;
use super::transport::{ConnectionId, Transport, TransportError};

/// Per-connection outbound buffer size
pub const OUTBOUND_BUFFER: usize = 256;

/// Tracks live connections and their session groups
pub struct ConnectionHub {
    /// Outbound channel per connection
    peers: DashMap<ConnectionId, mpsc::Sender<ServerMsg>>,
    /// Group members in join order
    groups: DashMap<SessionId, Vec<ConnectionId>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            groups: DashMap::new(),
        }
    }

    /// Register a connection and hand back the receiving end of its channel
    pub fn register(&self, conn: ConnectionId) -> mpsc::Receiver<ServerMsg> {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        self.peers.insert(conn, tx);
        rx
    }

    /// Drop a connection and its group memberships
    pub fn unregister(&self, conn: ConnectionId) {
        self.peers.remove(&conn);
        for mut group in self.groups.iter_mut() {
            group.value_mut().retain(|member| *member != conn);
        }
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    pub fn group_members(&self, group: &SessionId) -> Vec<ConnectionId> {
        self.groups
            .get(group)
            .map(|members| members.value().clone())
            .unwrap_or_default()
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ConnectionHub {
    fn send(&self, conn: ConnectionId, msg: ServerMsg) -> Result<(), TransportError> {
        let tx = self
            .peers
            .get(&conn)
            .map(|peer| peer.value().clone())
            .ok_or(TransportError::UnknownConnection(conn))?;

        tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Backpressure(conn),
            TrySendError::Closed(_) => TransportError::Closed(conn),
        })
    }

    fn broadcast(&self, group: SessionId, msg: ServerMsg) {
        for conn in self.group_members(&group) {
            if let Err(e) = self.send(conn, msg.clone()) {
                warn!(session_id = %group, error = %e, "Group delivery failed");
            }
        }
    }

    fn join_group(&self, conn: ConnectionId, group: SessionId) -> Result<(), TransportError> {
        if !self.peers.contains_key(&conn) {
            return Err(TransportError::UnknownConnection(conn));
        }

        let mut members = self.groups.entry(group).or_default();
        if !members.contains(&conn) {
            members.push(conn);
        }
        Ok(())
    }

    fn close_group(&self, group: SessionId) {
        if self.groups.remove(&group).is_some() {
            debug!(session_id = %group, "Group closed");
        }
    }

    fn is_connected(&self, conn: ConnectionId) -> bool {
        self.peers.contains_key(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn failed(message: &str) -> ServerMsg {
        ServerMsg::MatchFailed {
            message: message.to_string(),
        }
    }

    #[test]
    fn send_reaches_registered_connection() {
        let hub = ConnectionHub::new();
        let conn = Uuid::new_v4();
        let mut rx = hub.register(conn);

        hub.send(conn, failed("hi")).unwrap();
        assert_eq!(rx.try_recv().unwrap(), failed("hi"));
    }

    #[test]
    fn send_to_unknown_connection_errors() {
        let hub = ConnectionHub::new();
        let conn = Uuid::new_v4();
        assert!(matches!(
            hub.send(conn, failed("x")),
            Err(TransportError::UnknownConnection(c)) if c == conn
        ));
    }

    #[test]
    fn full_buffer_reports_backpressure() {
        let hub = ConnectionHub::new();
        let conn = Uuid::new_v4();
        let _rx = hub.register(conn);

        for _ in 0..OUTBOUND_BUFFER {
            hub.send(conn, failed("x")).unwrap();
        }
        assert!(matches!(
            hub.send(conn, failed("x")),
            Err(TransportError::Backpressure(_))
        ));
    }

    #[test]
    fn broadcast_preserves_order_per_member() {
        let hub = ConnectionHub::new();
        let group = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut rx_a = hub.register(a);
        let mut rx_b = hub.register(b);
        hub.join_group(a, group).unwrap();
        hub.join_group(b, group).unwrap();
        hub.join_group(b, group).unwrap();

        hub.broadcast(group, failed("1"));
        hub.broadcast(group, failed("2"));

        for rx in [&mut rx_a, &mut rx_b] {
            assert_eq!(rx.try_recv().unwrap(), failed("1"));
            assert_eq!(rx.try_recv().unwrap(), failed("2"));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn unregister_leaves_groups_and_blocks_joins() {
        let hub = ConnectionHub::new();
        let group = Uuid::new_v4();
        let conn = Uuid::new_v4();
        let _rx = hub.register(conn);
        hub.join_group(conn, group).unwrap();

        hub.unregister(conn);
        assert!(!hub.is_connected(conn));
        assert!(hub.group_members(&group).is_empty());
        assert!(hub.join_group(conn, group).is_err());
    }

    #[test]
    fn close_group_forgets_members() {
        let hub = ConnectionHub::new();
        let group = Uuid::new_v4();
        let conn = Uuid::new_v4();
        let mut rx = hub.register(conn);
        hub.join_group(conn, group).unwrap();

        hub.close_group(group);
        hub.close_group(group);
        hub.broadcast(group, failed("late"));
        assert!(rx.try_recv().is_err());
    }
}
