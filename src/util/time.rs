//! Time utilities for game simulation

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Default simulation rate
pub const SIMULATION_TPS: u32 = 60; // 60 ticks per second

/// Period between two ticks at the given rate
pub fn tick_period(ticks_per_second: u32) -> Duration {
    Duration::from_micros(1_000_000 / ticks_per_second.max(1) as u64)
}
