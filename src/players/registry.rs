//! Lookup table from connections to player identities

use dashmap::DashMap;
use uuid::Uuid;

use crate::game::PlayerId;
use crate::ws::protocol::PlayerInfo;
use crate::ws::transport::ConnectionId;

/// Known players and the connection each one arrived on
pub struct PlayerRegistry {
    players: DashMap<PlayerId, PlayerInfo>,
    /// Map of connection -> current player
    connections: DashMap<ConnectionId, PlayerId>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            players: DashMap::new(),
            connections: DashMap::new(),
        }
    }

    /// Mint a new player for a connection, replacing any previous binding
    pub fn register(&self, conn: ConnectionId, name: &str) -> PlayerInfo {
        let player = self.add(Uuid::new_v4(), name);
        self.connections.insert(conn, player.id);
        player
    }

    pub fn add(&self, id: PlayerId, name: &str) -> PlayerInfo {
        let info = PlayerInfo {
            id,
            name: name.to_string(),
        };
        self.players.insert(id, info.clone());
        info
    }

    pub fn get(&self, id: &PlayerId) -> Option<PlayerInfo> {
        self.players.get(id).map(|p| p.value().clone())
    }

    /// Forget a player and any connection bound to it
    pub fn remove(&self, id: &PlayerId) -> Option<PlayerInfo> {
        self.connections.retain(|_, player_id| *player_id != *id);
        self.players.remove(id).map(|(_, info)| info)
    }

    pub fn player_for(&self, conn: &ConnectionId) -> Option<PlayerId> {
        self.connections.get(conn).map(|p| *p.value())
    }

    pub fn connection_for(&self, player_id: &PlayerId) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|entry| entry.value() == player_id)
            .map(|entry| *entry.key())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
