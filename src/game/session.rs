//! Session records and the authoritative per-session world state

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use super::{
    PlayerId, SessionId, BALL_RADIUS, GAME_HEIGHT, GAME_WIDTH, PADDLE_HEIGHT, PADDLE_OFFSET_Y,
    PADDLE_WIDTH,
};

/// Which edge of the playfield a player defends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// First player of a pairing, defends the lower edge ("player one")
    Bottom,
    /// Second player of a pairing, defends the upper edge
    Top,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paddle {
    pub owner_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Paddle {
    /// Paddle centered horizontally at the edge defended by `role`
    pub fn for_role(owner_id: PlayerId, role: Role) -> Self {
        let y = match role {
            Role::Bottom => GAME_HEIGHT - PADDLE_OFFSET_Y - PADDLE_HEIGHT,
            Role::Top => PADDLE_OFFSET_Y,
        };
        Self {
            owner_id,
            x: GAME_WIDTH / 2.0 - PADDLE_WIDTH / 2.0,
            y,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub radius: f32,
}

impl Ball {
    /// Ball at the playfield center, not moving
    pub fn centered() -> Self {
        Self {
            x: GAME_WIDTH / 2.0,
            y: GAME_HEIGHT / 2.0,
            dx: 0.0,
            dy: 0.0,
            radius: BALL_RADIUS,
        }
    }
}

/// World state of one session (mutated by ticks and paddle input only)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Index 0 is the bottom defender, index 1 the top defender
    pub paddles: [Paddle; 2],
    pub ball: Ball,
    pub score: HashMap<PlayerId, u32>,
    pub game_over: bool,
    pub winner: Option<PlayerId>,
}

/// A live match between exactly two players
pub struct GameSession {
    pub id: SessionId,
    pub bottom_player_id: PlayerId,
    pub top_player_id: PlayerId,
    pub state: GameState,
    /// True iff a tick loop is scheduled for this session
    pub started: bool,
    pub created_at: DateTime<Utc>,
    /// Serve randomness, seeded per session
    pub rng: ChaCha8Rng,
}

impl GameSession {
    /// Build a fresh session with a random id and seed. The ball is centered
    /// and still; serving is up to the caller.
    pub fn new(bottom_player_id: PlayerId, top_player_id: PlayerId) -> Self {
        Self::with_seed(
            Uuid::new_v4(),
            bottom_player_id,
            top_player_id,
            rand::random::<u64>(),
        )
    }

    pub fn with_seed(
        id: SessionId,
        bottom_player_id: PlayerId,
        top_player_id: PlayerId,
        seed: u64,
    ) -> Self {
        debug_assert_ne!(bottom_player_id, top_player_id);

        let mut score = HashMap::with_capacity(2);
        score.insert(bottom_player_id, 0);
        score.insert(top_player_id, 0);

        Self {
            id,
            bottom_player_id,
            top_player_id,
            state: GameState {
                paddles: [
                    Paddle::for_role(bottom_player_id, Role::Bottom),
                    Paddle::for_role(top_player_id, Role::Top),
                ],
                ball: Ball::centered(),
                score,
                game_over: false,
                winner: None,
            },
            started: false,
            created_at: Utc::now(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn role_of(&self, player_id: &PlayerId) -> Option<Role> {
        if *player_id == self.bottom_player_id {
            Some(Role::Bottom)
        } else if *player_id == self.top_player_id {
            Some(Role::Top)
        } else {
            None
        }
    }

    pub fn opponent_of(&self, player_id: &PlayerId) -> Option<PlayerId> {
        match self.role_of(player_id)? {
            Role::Bottom => Some(self.top_player_id),
            Role::Top => Some(self.bottom_player_id),
        }
    }

    pub fn paddle(&self, role: Role) -> &Paddle {
        match role {
            Role::Bottom => &self.state.paddles[0],
            Role::Top => &self.state.paddles[1],
        }
    }

    pub fn paddle_mut(&mut self, role: Role) -> &mut Paddle {
        match role {
            Role::Bottom => &mut self.state.paddles[0],
            Role::Top => &mut self.state.paddles[1],
        }
    }

    pub fn score_of(&self, player_id: &PlayerId) -> u32 {
        self.state.score.get(player_id).copied().unwrap_or(0)
    }

    /// Store a client-requested paddle position, clamped to the playfield.
    /// Returns false when the request was ignored.
    pub fn move_paddle(&mut self, player_id: &PlayerId, requested_x: f32) -> bool {
        if !self.started || requested_x.is_nan() {
            return false;
        }
        let Some(role) = self.role_of(player_id) else {
            return false;
        };

        let paddle = self.paddle_mut(role);
        paddle.x = requested_x.clamp(0.0, GAME_WIDTH - paddle.width);
        true
    }
}
