//! Connection coordinator - binds client events to matchmaking and sessions

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::game::{PlayerId, SessionHandle, SessionId, SessionStore, SimulationEngine};
use crate::matchmaking::MatchmakingService;
use crate::players::PlayerRegistry;
use crate::ws::protocol::{
    ClientMsg, GameStartPayload, OpponentDisconnectedPayload, PlayerInfo, SelfInfo, ServerMsg,
};
use crate::ws::transport::{ConnectionId, Transport};

const MATCH_FAILED_MESSAGE: &str = "Failed to connect with opponent. Please try joining again.";
const UNKNOWN_OPPONENT_NAME: &str = "Your opponent";

pub struct Coordinator {
    players: Arc<PlayerRegistry>,
    matchmaking: Arc<MatchmakingService>,
    sessions: Arc<SessionStore>,
    engine: Arc<SimulationEngine>,
    transport: Arc<dyn Transport>,
    /// Serializes joins and disconnects against each other
    lifecycle: Mutex<()>,
}

impl Coordinator {
    pub fn new(
        players: Arc<PlayerRegistry>,
        matchmaking: Arc<MatchmakingService>,
        sessions: Arc<SessionStore>,
        engine: Arc<SimulationEngine>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            players,
            matchmaking,
            sessions,
            engine,
            transport,
            lifecycle: Mutex::new(()),
        }
    }

    /// Route one inbound message from a connection
    pub fn handle(&self, conn: ConnectionId, msg: ClientMsg) {
        match msg {
            ClientMsg::JoinGame { name } => self.join(conn, &name),
            ClientMsg::PaddleMove { new_x } => self.paddle_move(conn, new_x),
        }
    }

    pub fn join(&self, conn: ConnectionId, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            debug!(conn_id = %conn, "Join with blank name ignored");
            return;
        }

        let _guard = self.lifecycle.lock();

        if let Some(previous) = self.players.player_for(&conn) {
            if self.matchmaking.contains(&previous) || self.sessions.find_by_player(&previous).is_some() {
                debug!(conn_id = %conn, player_id = %previous, "Duplicate join ignored");
                return;
            }
            self.players.remove(&previous);
        }

        let player = self.players.register(conn, name);
        info!(conn_id = %conn, player_id = %player.id, name = %player.name, "Player joined");

        if let Some(session) = self.matchmaking.enqueue(player) {
            self.start_session(&session);
        }
    }

    /// Wire a fresh pairing to both connections, or roll it back
    fn start_session(&self, session: &SessionHandle) {
        let (session_id, bottom_id, top_id) = {
            let s = session.lock();
            (s.id, s.bottom_player_id, s.top_player_id)
        };

        let (Some(bottom), Some(top)) = (self.players.get(&bottom_id), self.players.get(&top_id)) else {
            warn!(session_id = %session_id, "Paired player missing from registry");
            self.roll_back(session_id, &[bottom_id, top_id]);
            return;
        };

        let bottom_conn = self.locate(&bottom_id);
        let top_conn = self.locate(&top_id);

        let grouped = match (bottom_conn, top_conn) {
            (Some(b), Some(t)) => self
                .transport
                .join_group(b, session_id)
                .and_then(|_| self.transport.join_group(t, session_id))
                .map(|_| (b, t))
                .ok(),
            _ => None,
        };

        let Some((bottom_conn, top_conn)) = grouped else {
            warn!(session_id = %session_id, "Pairing failed, opponent connection missing");
            self.roll_back(session_id, &[bottom_id, top_id]);

            for conn in [bottom_conn, top_conn].into_iter().flatten() {
                let failed = ServerMsg::MatchFailed {
                    message: MATCH_FAILED_MESSAGE.to_string(),
                };
                if let Err(e) = self.transport.send(conn, failed) {
                    debug!(conn_id = %conn, error = %e, "Match failure notice not delivered");
                }
            }
            return;
        };

        self.send_game_start(bottom_conn, session_id, &bottom, &top, true);
        self.send_game_start(top_conn, session_id, &top, &bottom, false);

        self.engine.start(session_id);
    }

    fn send_game_start(
        &self,
        conn: ConnectionId,
        session_id: SessionId,
        me: &PlayerInfo,
        opponent: &PlayerInfo,
        is_player_one: bool,
    ) {
        let msg = ServerMsg::GameStart(GameStartPayload {
            session_id,
            me: SelfInfo {
                player: me.clone(),
                is_player_one,
            },
            opponent: opponent.clone(),
        });
        if let Err(e) = self.transport.send(conn, msg) {
            warn!(conn_id = %conn, error = %e, "Game start not delivered");
        }
    }

    fn roll_back(&self, session_id: SessionId, players: &[PlayerId]) {
        for player_id in players {
            self.matchmaking.dequeue(player_id);
        }
        self.sessions.remove(&session_id);
        self.transport.close_group(session_id);
    }

    /// Live connection of a player, if it is still attached
    fn locate(&self, player_id: &PlayerId) -> Option<ConnectionId> {
        self.players
            .connection_for(player_id)
            .filter(|conn| self.transport.is_connected(*conn))
    }

    pub fn paddle_move(&self, conn: ConnectionId, new_x: f32) {
        let Some(player_id) = self.players.player_for(&conn) else {
            return;
        };
        let Some(session) = self.sessions.find_by_player(&player_id) else {
            return;
        };
        let session_id = session.lock().id;

        self.engine.apply_paddle_move(&session_id, &player_id, new_x);
    }

    pub fn disconnect(&self, conn: ConnectionId) {
        let _guard = self.lifecycle.lock();

        let Some(player_id) = self.players.player_for(&conn) else {
            debug!(conn_id = %conn, "Disconnect without a player");
            return;
        };
        let departed = self.players.get(&player_id);

        if let Some(session) = self.sessions.find_by_player(&player_id) {
            let (session_id, opponent_id) = {
                let s = session.lock();
                (s.id, s.opponent_of(&player_id))
            };

            // Tear down first so no snapshot can follow the notice
            self.sessions.remove(&session_id);
            self.transport.close_group(session_id);
            info!(session_id = %session_id, player_id = %player_id, "Session ended by disconnect");

            if let Some(opponent_conn) = opponent_id.and_then(|id| self.locate(&id)) {
                let notice = ServerMsg::OpponentDisconnected(OpponentDisconnectedPayload {
                    opponent_name: departed
                        .as_ref()
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| UNKNOWN_OPPONENT_NAME.to_string()),
                    opponent_id: player_id,
                });
                if let Err(e) = self.transport.send(opponent_conn, notice) {
                    debug!(conn_id = %opponent_conn, error = %e, "Disconnect notice not delivered");
                }
            }
        }

        self.players.remove(&player_id);
        self.matchmaking.dequeue(&player_id);
        info!(conn_id = %conn, player_id = %player_id, "Player left");
    }
}
