// Domain layer: replicated entities, timers and the damage state machine.

pub mod avatar;
pub mod enemy;
pub mod identity;
pub mod ports;
pub mod projectile;
pub mod replica;
pub mod state;
pub mod timer;
pub mod tuning;

pub use avatar::{Avatar, DamageOutcome};
pub use enemy::{Enemy, EnemyHit};
pub use identity::{IdentityAllocator, NetworkIdentity, PeerId, RetiredIds};
pub use projectile::Projectile;
pub use replica::Replica;
pub use state::ReplicatedState;
pub use timer::Countdown;
