use crate::interface_adapters::utils::rng::random_peer_id;
use std::{env, time::Duration};

// Runtime/process constants (not gameplay tuning).

pub fn relay_port() -> u16 {
    env::var("RELAY_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn relay_url() -> String {
    env::var("RELAY_URL").unwrap_or_else(|_| "ws://127.0.0.1:3001/ws".to_string())
}

pub fn session_id() -> String {
    env::var("SESSION_ID").unwrap_or_else(|_| "test".to_string())
}

// Falls back to a random id so two local peers don't collide by default.
pub fn peer_id() -> u32 {
    env::var("PEER_ID")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|id| *id != 0)
        .unwrap_or_else(random_peer_id)
}

pub fn persistence_url() -> String {
    env::var("PERSISTENCE_URL").unwrap_or_else(|_| "http://127.0.0.1:3003".to_string())
}

pub fn persistence_timeout() -> Duration {
    let millis = env::var("PERSISTENCE_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);
pub const STATE_SEND_INTERVAL_TICKS: u64 = 6;

pub const RELAY_FRAME_CAPACITY: usize = 256;
pub const LINK_CHANNEL_CAPACITY: usize = 1024;
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;
pub const PROFILE_CHANNEL_CAPACITY: usize = 64;

// How long a peer keeps ticking after ctrl-c so the final statistics can go out.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);
