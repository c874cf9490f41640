// Use cases layer: per-peer session workflows and the relay registry.

pub mod peer;
pub mod profile;
pub mod relay;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use peer::{PeerChannels, peer_task};
pub use profile::{ProfileCache, ProfileClient, ProfileOutcome};
pub use relay::{RelayError, RelayHandle, RelayRegistry};
pub use session::{PeerSession, SessionSettings};
pub use types::{
    DamageSource, Envelope, LocalCommand, PeerMessage, SessionEvent, StateFrame, TransformFrame,
    VictimKind,
};
