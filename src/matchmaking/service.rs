//! Matchmaking service - publishes pairings into the session store

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use crate::game::{PlayerId, SessionHandle, SessionStore};
use crate::ws::protocol::PlayerInfo;

use super::queue::MatchmakingQueue;

/// Matchmaking service
pub struct MatchmakingService {
    queue: Mutex<MatchmakingQueue>,
    store: Arc<SessionStore>,
}

impl MatchmakingService {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            queue: Mutex::new(MatchmakingQueue::new()),
            store,
        }
    }

    /// Queue a player; on pairing the new session is already in the store
    pub fn enqueue(&self, player: PlayerInfo) -> Option<SessionHandle> {
        let player_id = player.id;
        let mut queue = self.queue.lock();

        let Some(session) = queue.enqueue(player) else {
            info!(player_id = %player_id, queue_size = queue.len(), "Player waiting for opponent");
            return None;
        };

        info!(
            session_id = %session.id,
            bottom_player_id = %session.bottom_player_id,
            top_player_id = %session.top_player_id,
            "Paired players into new session"
        );

        // Still under the queue lock: a player is always either queued or stored
        Some(self.store.create(session))
    }

    pub fn dequeue(&self, player_id: &PlayerId) {
        self.queue.lock().dequeue(player_id);
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.queue.lock().contains(player_id)
    }

    /// Get current queue size
    pub fn queue_length(&self) -> usize {
        self.queue.lock().len()
    }

    /// How long the head of the queue has been waiting
    pub fn longest_wait(&self) -> Option<Duration> {
        self.queue.lock().oldest_wait()
    }
}
