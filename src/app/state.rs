//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::game::{SessionStore, SimulationEngine};
use crate::matchmaking::MatchmakingService;
use crate::players::PlayerRegistry;
use crate::util::time::tick_period;
use crate::ws::ConnectionHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: Arc<ConnectionHub>,
    pub players: Arc<PlayerRegistry>,
    pub sessions: Arc<SessionStore>,
    pub matchmaking: Arc<MatchmakingService>,
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Initialize connection hub (the transport seen by the game core)
        let hub = Arc::new(ConnectionHub::new());

        // Initialize registries
        let players = Arc::new(PlayerRegistry::new());
        let sessions = Arc::new(SessionStore::new());

        // Initialize matchmaking and simulation
        let matchmaking = Arc::new(MatchmakingService::new(sessions.clone()));
        let engine = Arc::new(SimulationEngine::new(
            sessions.clone(),
            hub.clone(),
            tick_period(config.tick_rate_hz),
        ));

        let coordinator = Arc::new(Coordinator::new(
            players.clone(),
            matchmaking.clone(),
            sessions.clone(),
            engine,
            hub.clone(),
        ));

        Self {
            config,
            hub,
            players,
            sessions,
            matchmaking,
            coordinator,
        }
    }
}
