//! Game simulation modules

pub mod engine;
pub mod physics;
pub mod session;
pub mod snapshot;
pub mod store;

pub use engine::SimulationEngine;
pub use session::GameSession;
pub use store::{SessionHandle, SessionStore};

use uuid::Uuid;

pub type PlayerId = Uuid;
pub type SessionId = Uuid;

/// Playfield width in playfield units
pub const GAME_WIDTH: f32 = 500.0;
/// Playfield height in playfield units
pub const GAME_HEIGHT: f32 = 600.0;
pub const PADDLE_WIDTH: f32 = 80.0;
pub const PADDLE_HEIGHT: f32 = 12.0;
/// Gap between a paddle and the edge it defends
pub const PADDLE_OFFSET_Y: f32 = 20.0;
pub const BALL_RADIUS: f32 = 8.0;
/// Serve speed in playfield units per tick
pub const INITIAL_BALL_SPEED: f32 = 6.0;
/// Points needed to win a session
pub const MAX_SCORE: u32 = 5;
