//! Matchmaking: FIFO pairing of waiting players

pub mod queue;
pub mod service;

pub use service::MatchmakingService;
