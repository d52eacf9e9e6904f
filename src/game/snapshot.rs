//! Snapshot building for network transmission

use crate::ws::protocol::{
    BallSnapshot, PaddleSnapshot, Position, ServerMsg, StateUpdatePayload, Velocity,
};

use super::session::Role;
use super::GameSession;

/// Build the periodic `gameStateUpdate` message for a session
pub fn state_update(session: &GameSession) -> ServerMsg {
    let ball = &session.state.ball;

    let paddles = [Role::Bottom, Role::Top]
        .into_iter()
        .map(|role| {
            let paddle = session.paddle(role);
            (paddle.owner_id, PaddleSnapshot { x: paddle.x })
        })
        .collect();

    let scores = [session.bottom_player_id, session.top_player_id]
        .into_iter()
        .map(|id| (id, session.score_of(&id)))
        .collect();

    ServerMsg::GameStateUpdate(StateUpdatePayload {
        ball: BallSnapshot {
            position: Position {
                x: ball.x,
                y: ball.y,
            },
            velocity: Velocity {
                dx: ball.dx,
                dy: ball.dy,
            },
            radius: ball.radius,
        },
        paddles,
        scores,
    })
}
