//! Registry of live sessions and their tick loops

use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{GameSession, PlayerId, SessionId};

/// Shared, individually locked session record
pub type SessionHandle = Arc<Mutex<GameSession>>;

/// Owns every live session, the player index, and the loop handles
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionHandle>,
    /// Map of player -> current session
    player_sessions: DashMap<PlayerId, SessionId>,
    /// Scheduled tick loops by session
    loops: DashMap<SessionId, JoinHandle<()>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            player_sessions: DashMap::new(),
            loops: DashMap::new(),
        }
    }

    /// Take ownership of a session and index both of its players
    pub fn create(&self, session: GameSession) -> SessionHandle {
        let id = session.id;
        self.player_sessions.insert(session.bottom_player_id, id);
        self.player_sessions.insert(session.top_player_id, id);

        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id, handle.clone());
        handle
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    /// Stop the session's loop and drop the record.
    /// Returns whether a record existed.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.stop_loop(id);

        let Some((_, handle)) = self.sessions.remove(id) else {
            debug!(session_id = %id, "Remove of unknown session ignored");
            return false;
        };

        let (bottom, top, created_at) = {
            let session = handle.lock();
            (session.bottom_player_id, session.top_player_id, session.created_at)
        };
        for player_id in [bottom, top] {
            self.player_sessions.remove_if(&player_id, |_, sid| sid == id);
        }

        let age_secs = (Utc::now() - created_at).num_seconds();
        debug!(session_id = %id, age_secs, "Session removed");
        true
    }

    pub fn find_by_player(&self, player_id: &PlayerId) -> Option<SessionHandle> {
        let session_id = *self.player_sessions.get(player_id)?;
        self.get(&session_id)
    }

    /// Register a loop for the session unless one is already scheduled.
    /// `spawn` only runs when the slot is free.
    pub fn attach_loop<F>(&self, id: SessionId, spawn: F) -> bool
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        match self.loops.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(spawn());
                true
            }
        }
    }

    /// Cancel the session's loop and mark it not started. Safe to repeat.
    pub fn stop_loop(&self, id: &SessionId) -> bool {
        let cancelled = match self.loops.remove(id) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        };

        if let Some(session) = self.get(id) {
            session.lock().started = false;
        }
        cancelled
    }

    pub fn has_loop(&self, id: &SessionId) -> bool {
        self.loops.contains_key(id)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session() -> GameSession {
        GameSession::with_seed(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 0)
    }

    #[test]
    fn create_get_and_find() {
        let store = SessionStore::new();
        let s = session();
        let (id, bottom, top) = (s.id, s.bottom_player_id, s.top_player_id);
        store.create(s);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().lock().id, id);
        assert_eq!(store.find_by_player(&bottom).unwrap().lock().id, id);
        assert_eq!(store.find_by_player(&top).unwrap().lock().id, id);
        assert!(store.find_by_player(&Uuid::new_v4()).is_none());
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let store = SessionStore::new();
        let s = session();
        let (id, bottom) = (s.id, s.bottom_player_id);
        store.create(s);

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert_eq!(store.len(), 0);
        assert!(store.find_by_player(&bottom).is_none());
    }

    #[test]
    fn remove_keeps_index_of_newer_session() {
        let store = SessionStore::new();
        let old = session();
        let (old_id, player) = (old.id, old.bottom_player_id);
        store.create(old);

        let newer = GameSession::with_seed(Uuid::new_v4(), player, Uuid::new_v4(), 0);
        let newer_id = newer.id;
        store.create(newer);

        store.remove(&old_id);
        assert_eq!(store.find_by_player(&player).unwrap().lock().id, newer_id);
    }

    #[tokio::test]
    async fn loops_attach_once_and_stop_twice() {
        let store = SessionStore::new();
        let s = session();
        let id = s.id;
        let handle = store.create(s);
        handle.lock().started = true;

        assert!(store.attach_loop(id, || tokio::spawn(std::future::pending())));
        assert!(!store.attach_loop(id, || unreachable!("loop already attached")));
        assert!(store.has_loop(&id));

        assert!(store.stop_loop(&id));
        assert!(!handle.lock().started);
        assert!(!store.stop_loop(&id));
        assert!(!store.has_loop(&id));
    }

    #[tokio::test]
    async fn remove_stops_loop_first() {
        let store = SessionStore::new();
        let s = session();
        let id = s.id;
        let handle = store.create(s);
        handle.lock().started = true;
        store.attach_loop(id, || tokio::spawn(std::future::pending()));

        assert!(store.remove(&id));
        assert!(!store.has_loop(&id));
        assert!(!handle.lock().started);
    }
}
