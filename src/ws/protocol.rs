//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Player identity as shared with clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Request to be matched with an opponent
    JoinGame {
        /// Display name, ignored when blank
        name: String,
    },

    /// Requested paddle position (left edge, playfield units)
    PaddleMove {
        #[serde(rename = "newX", alias = "newx")]
        new_x: f32,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Pairing completed, sent individually to each participant
    GameStart(GameStartPayload),

    /// Per-tick world snapshot
    GameStateUpdate(StateUpdatePayload),

    /// Session finished with a winner
    GameOver(GameOverPayload),

    /// The other participant left mid-session
    OpponentDisconnected(OpponentDisconnectedPayload),

    /// Pairing could not be completed
    MatchFailed {
        message: String,
    },
}

/// Self view inside `gameStart`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfInfo {
    #[serde(flatten)]
    pub player: PlayerInfo,
    /// True for the bottom defender
    pub is_player_one: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartPayload {
    pub session_id: Uuid,
    #[serde(rename = "self")]
    pub me: SelfInfo,
    pub opponent: PlayerInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

/// Ball state in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub position: Position,
    pub velocity: Velocity,
    pub radius: f32,
}

/// Paddle state in a snapshot (only `x` moves)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleSnapshot {
    pub x: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdatePayload {
    pub ball: BallSnapshot,
    pub paddles: HashMap<Uuid, PaddleSnapshot>,
    pub scores: HashMap<Uuid, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverPayload {
    pub session_id: Uuid,
    pub winner_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentDisconnectedPayload {
    pub opponent_name: String,
    pub opponent_id: Uuid,
}
