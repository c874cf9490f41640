// Network adapters split by relay-side sockets and the peer-side link.

pub mod link;
pub mod relay;

pub use link::{LinkError, PeerLink, connect};
pub use relay::{session_members_handler, ws_handler};
