//! Outbound delivery seam between the game core and connections

use uuid::Uuid;

use crate::game::SessionId;

use super::protocol::ServerMsg;

/// Identity of one live client connection
pub type ConnectionId = Uuid;

/// Delivery failures, logged by callers and never fatal
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    #[error("Outbound buffer full for connection {0}")]
    Backpressure(ConnectionId),

    #[error("Connection {0} closed")]
    Closed(ConnectionId),
}

/// Point-to-point and group delivery of server messages.
///
/// Messages sent to one group are delivered to each member in send order.
pub trait Transport: Send + Sync {
    /// Send to a single connection
    fn send(&self, conn: ConnectionId, msg: ServerMsg) -> Result<(), TransportError>;

    /// Send to every member of a group; missing members are skipped
    fn broadcast(&self, group: SessionId, msg: ServerMsg);

    /// Add a live connection to a group
    fn join_group(&self, conn: ConnectionId, group: SessionId) -> Result<(), TransportError>;

    /// Forget a group and its membership
    fn close_group(&self, group: SessionId);

    fn is_connected(&self, conn: ConnectionId) -> bool;
}
