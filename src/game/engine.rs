//! Authoritative per-session tick loops

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::ws::protocol::{GameOverPayload, ServerMsg};
use crate::ws::transport::Transport;

use super::physics::{self, StepOutcome};
use super::snapshot;
use super::{PlayerId, SessionHandle, SessionId, SessionStore};

/// What the loop should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Keep ticking
    Running,
    /// Session gone or stopped; exit quietly
    Stopped,
    /// Session was won; tear it down
    Finished,
}

/// Drives every live session at a fixed rate
pub struct SimulationEngine {
    store: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    tick_period: Duration,
}

impl SimulationEngine {
    pub fn new(store: Arc<SessionStore>, transport: Arc<dyn Transport>, tick_period: Duration) -> Self {
        Self {
            store,
            transport,
            tick_period,
        }
    }

    /// Schedule the session's tick loop. A no-op if one is already running.
    pub fn start(self: &Arc<Self>, session_id: SessionId) -> bool {
        let Some(session) = self.store.get(&session_id) else {
            debug!(session_id = %session_id, "Start requested for unknown session");
            return false;
        };
        if self.store.has_loop(&session_id) {
            debug!(session_id = %session_id, "Session already running");
            return false;
        }

        let engine = Arc::clone(self);
        let attached = self.store.attach_loop(session_id, || {
            session.lock().started = true;
            tokio::spawn(engine.run(session_id))
        });

        if attached {
            info!(session_id = %session_id, "Session started");
        }
        attached
    }

    /// Cancel the session's tick loop. Safe to call repeatedly.
    pub fn stop(&self, session_id: &SessionId) -> bool {
        self.store.stop_loop(session_id)
    }

    async fn run(self: Arc<Self>, session_id: SessionId) {
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            match self.tick(&session_id) {
                TickStatus::Running => {}
                TickStatus::Stopped => break,
                TickStatus::Finished => {
                    self.store.remove(&session_id);
                    self.transport.close_group(session_id);
                    info!(session_id = %session_id, "Finished session removed");
                    break;
                }
            }
        }

        debug!(session_id = %session_id, "Tick loop exited");
    }

    /// Advance one session by a single tick and broadcast the result
    pub fn tick(&self, session_id: &SessionId) -> TickStatus {
        let Some(session) = self.store.get(session_id) else {
            debug!(session_id = %session_id, "Tick for removed session");
            self.stop(session_id);
            return TickStatus::Stopped;
        };

        let outcome = {
            let mut s = session.lock();
            if !s.started || s.state.game_over {
                drop(s);
                debug!(session_id = %session_id, "Tick for inactive session");
                self.stop(session_id);
                return TickStatus::Stopped;
            }

            let outcome = physics::step(&mut s);
            // Broadcast under the lock so a concurrent stop_loop waits for it
            if !matches!(outcome, StepOutcome::Won { .. }) {
                self.transport.broadcast(*session_id, snapshot::state_update(&s));
            }
            outcome
        };

        match outcome {
            StepOutcome::Won { winner } => {
                self.declare_win(&session, winner);
                TickStatus::Finished
            }
            StepOutcome::Scored { scorer } => {
                debug!(session_id = %session_id, scorer = %scorer, "Point scored");
                TickStatus::Running
            }
            StepOutcome::Rally => TickStatus::Running,
        }
    }

    /// End the session with a winner and announce it once
    pub fn declare_win(&self, session: &SessionHandle, winner_id: PlayerId) {
        let session_id = {
            let mut s = session.lock();
            if s.state.game_over {
                return;
            }
            s.state.game_over = true;
            s.state.winner = Some(winner_id);
            s.id
        };

        self.stop(&session_id);
        self.transport.broadcast(
            session_id,
            ServerMsg::GameOver(GameOverPayload {
                session_id,
                winner_id,
            }),
        );

        info!(session_id = %session_id, winner_id = %winner_id, "Session won");
    }

    /// Apply a client paddle position to the caller's own paddle
    pub fn apply_paddle_move(&self, session_id: &SessionId, player_id: &PlayerId, requested_x: f32) -> bool {
        match self.store.get(session_id) {
            Some(session) => session.lock().move_paddle(player_id, requested_x),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::session::Role;
    use crate::game::{GameSession, MAX_SCORE};
    use crate::util::time::tick_period;
    use crate::ws::hub::ConnectionHub;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    struct Harness {
        store: Arc<SessionStore>,
        engine: Arc<SimulationEngine>,
        session: SessionHandle,
        id: SessionId,
        rx: mpsc::Receiver<ServerMsg>,
    }

    fn harness() -> Harness {
        let store = Arc::new(SessionStore::new());
        let hub = Arc::new(ConnectionHub::new());
        let engine = Arc::new(SimulationEngine::new(
            store.clone(),
            hub.clone(),
            tick_period(60),
        ));

        let session = store.create(GameSession::with_seed(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            99,
        ));
        let id = session.lock().id;

        let conn = Uuid::new_v4();
        let rx = hub.register(conn);
        hub.join_group(conn, id).unwrap();

        Harness {
            store,
            engine,
            session,
            id,
            rx,
        }
    }

    fn aim_at_top_edge(session: &SessionHandle) {
        let mut s = session.lock();
        let ball = &mut s.state.ball;
        ball.x = 100.0;
        ball.y = 9.0;
        ball.dx = 0.0;
        ball.dy = -4.0;
    }

    #[test]
    fn tick_broadcasts_snapshot() {
        let mut h = harness();
        h.session.lock().started = true;

        assert_eq!(h.engine.tick(&h.id), TickStatus::Running);
        assert!(matches!(h.rx.try_recv(), Ok(ServerMsg::GameStateUpdate(_))));
    }

    #[test]
    fn tick_on_inactive_session_stops() {
        let mut h = harness();
        assert_eq!(h.engine.tick(&h.id), TickStatus::Stopped);
        assert!(h.rx.try_recv().is_err());

        assert_eq!(h.engine.tick(&Uuid::new_v4()), TickStatus::Stopped);
    }

    #[test]
    fn point_scores_for_bottom_defender_only() {
        let mut h = harness();
        h.session.lock().started = true;
        aim_at_top_edge(&h.session);

        assert_eq!(h.engine.tick(&h.id), TickStatus::Running);

        let s = h.session.lock();
        assert_eq!(s.score_of(&s.bottom_player_id), 1);
        assert_eq!(s.score_of(&s.top_player_id), 0);
        let Ok(ServerMsg::GameStateUpdate(update)) = h.rx.try_recv() else {
            panic!("expected snapshot");
        };
        assert_eq!(update.scores[&s.bottom_player_id], 1);
    }

    #[test]
    fn reaching_max_score_ends_session() {
        let mut h = harness();
        let (p1, p2) = {
            let mut s = h.session.lock();
            s.started = true;
            let (p1, p2) = (s.bottom_player_id, s.top_player_id);
            s.state.score.insert(p1, MAX_SCORE - 1);
            (p1, p2)
        };
        aim_at_top_edge(&h.session);

        assert_eq!(h.engine.tick(&h.id), TickStatus::Finished);

        {
            let s = h.session.lock();
            assert_eq!(s.score_of(&p1), 5);
            assert_eq!(s.score_of(&p2), 0);
            assert!(s.state.game_over);
            assert_eq!(s.state.winner, Some(p1));
            assert!(!s.started);
        }

        assert_eq!(
            h.rx.try_recv().unwrap(),
            ServerMsg::GameOver(GameOverPayload {
                session_id: h.id,
                winner_id: p1
            })
        );
        assert!(h.rx.try_recv().is_err());

        // inert afterwards
        assert_eq!(h.engine.tick(&h.id), TickStatus::Stopped);
        h.engine.declare_win(&h.session, p2);
        assert_eq!(h.session.lock().state.winner, Some(p1));
        assert!(h.rx.try_recv().is_err());
    }

    #[test]
    fn paddle_move_is_validated() {
        let h = harness();
        let p1 = h.session.lock().bottom_player_id;

        // not started yet
        assert!(!h.engine.apply_paddle_move(&h.id, &p1, 5.0));

        h.session.lock().started = true;
        assert!(h.engine.apply_paddle_move(&h.id, &p1, -50.0));
        assert_eq!(h.session.lock().paddle(Role::Bottom).x, 0.0);
        assert!(h.engine.apply_paddle_move(&h.id, &p1, 10_000.0));
        assert_eq!(h.session.lock().paddle(Role::Bottom).x, 420.0);

        assert!(!h.engine.apply_paddle_move(&h.id, &Uuid::new_v4(), 5.0));
        assert!(!h.engine.apply_paddle_move(&Uuid::new_v4(), &p1, 5.0));
    }

    #[test]
    fn paddle_move_shows_in_next_snapshot() {
        let mut h = harness();
        let p2 = {
            let mut s = h.session.lock();
            s.started = true;
            s.top_player_id
        };

        h.engine.apply_paddle_move(&h.id, &p2, 42.0);
        h.engine.tick(&h.id);

        let Ok(ServerMsg::GameStateUpdate(update)) = h.rx.try_recv() else {
            panic!("expected snapshot");
        };
        assert_eq!(update.paddles[&p2].x, 42.0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let mut h = harness();

        assert!(h.engine.start(h.id));
        assert!(!h.engine.start(h.id));
        assert!(h.session.lock().started);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut snapshots = 0;
        while let Ok(msg) = h.rx.try_recv() {
            assert!(matches!(msg, ServerMsg::GameStateUpdate(_)));
            snapshots += 1;
        }
        assert!(snapshots >= 5);

        assert!(h.engine.stop(&h.id));
        assert!(!h.engine.stop(&h.id));
        assert!(!h.session.lock().started);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(h.rx.try_recv().is_err());
        assert!(h.store.get(&h.id).is_some());
    }

    #[tokio::test]
    async fn start_unknown_session_is_refused() {
        let h = harness();
        assert!(!h.engine.start(Uuid::new_v4()));
    }

    #[tokio::test(start_paused = true)]
    async fn loop_tears_down_won_session() {
        let mut h = harness();
        {
            let mut s = h.session.lock();
            let p1 = s.bottom_player_id;
            s.state.score.insert(p1, MAX_SCORE - 1);
        }
        aim_at_top_edge(&h.session);

        assert!(h.engine.start(h.id));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(matches!(h.rx.try_recv(), Ok(ServerMsg::GameOver(_))));
        assert!(h.store.get(&h.id).is_none());
        assert!(!h.store.has_loop(&h.id));
    }
}
