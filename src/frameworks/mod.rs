// Process wiring: configuration, relay server bootstrap and the peer runtime.

pub mod config;
pub mod peer;
pub mod server;
