//! Matchmaking queue implementation

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::game::physics::serve;
use crate::game::{GameSession, PlayerId};
use crate::ws::protocol::PlayerInfo;

/// Player in the matchmaking queue
#[derive(Debug, Clone)]
pub struct QueuedPlayer {
    pub info: PlayerInfo,
    pub queued_at: Instant,
}

impl QueuedPlayer {
    pub fn new(info: PlayerInfo) -> Self {
        Self {
            info,
            queued_at: Instant::now(),
        }
    }

    /// How long this player has been waiting
    pub fn wait_time(&self) -> Duration {
        self.queued_at.elapsed()
    }
}

/// The matchmaking queue
#[derive(Default)]
pub struct MatchmakingQueue {
    queue: VecDeque<QueuedPlayer>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player to the queue.
    ///
    /// Returns a freshly served session once two players are waiting. The
    /// earlier arrival becomes the bottom defender. An id that is already
    /// queued is ignored.
    pub fn enqueue(&mut self, player: PlayerInfo) -> Option<GameSession> {
        if self.contains(&player.id) {
            return None;
        }
        self.queue.push_back(QueuedPlayer::new(player));

        if self.queue.len() < 2 {
            return None;
        }
        let bottom = self.queue.pop_front()?;
        let top = self.queue.pop_front()?;

        let mut session = GameSession::new(bottom.info.id, top.info.id);
        serve(&mut session, None);
        Some(session)
    }

    /// Remove a player from the queue
    pub fn dequeue(&mut self, player_id: &PlayerId) -> Option<QueuedPlayer> {
        let pos = self.queue.iter().position(|p| &p.info.id == player_id)?;
        self.queue.remove(pos)
    }

    /// Check if a player is in the queue
    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.queue.iter().any(|p| &p.info.id == player_id)
    }

    /// Get queue length
    pub fn len(&self) -> usize {
        self.queue.len()
    }


    /// Longest current wait, if anyone is queued
    pub fn oldest_wait(&self) -> Option<Duration> {
        self.queue.front().map(|p| p.wait_time())
    }
}
