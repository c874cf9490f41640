// Gameplay tuning, kept apart from runtime configuration.

pub mod enemy;
pub mod player;
pub mod projectile;

pub use enemy::EnemyTuning;
pub use player::PlayerTuning;
pub use projectile::ProjectileTuning;
