use super::identity::PeerId;
use super::timer::Countdown;
use super::tuning::ProjectileTuning;
use glam::{Vec3, Vec3Swizzles};
use std::time::Duration;

/// Transient projectile. Movement is deterministic from the spawn event, so every peer
/// integrates it locally instead of replicating its transform.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub owner: PeerId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    lifetime: Countdown,
    destroy_requested: bool,
}

impl Projectile {
    /// Spawns at the fixed vertical offset, travelling horizontally along `direction`.
    pub fn spawn(owner: PeerId, origin: Vec3, direction: Vec3, tuning: &ProjectileTuning) -> Self {
        let heading = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
        Self {
            owner,
            position: Vec3::new(origin.x, tuning.spawn_height, origin.z),
            velocity: heading * tuning.speed,
            radius: tuning.radius,
            lifetime: Countdown::new(tuning.life_time),
            destroy_requested: false,
        }
    }

    /// Moves one tick and counts down the lifetime. Returns true on the tick it expires.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.position += self.velocity * dt.as_secs_f32();
        self.lifetime.tick(dt)
    }

    pub fn remaining_life(&self) -> Duration {
        self.lifetime.remaining()
    }

    /// Horizontal overlap test against a circular target.
    pub fn overlaps(&self, center: Vec3, radius: f32) -> bool {
        let reach = self.radius + radius;
        self.position.xz().distance_squared(center.xz()) <= reach * reach
    }

    /// Returns true the first time; a peer emits at most one destroy per projectile.
    pub fn request_destroy(&mut self) -> bool {
        !std::mem::replace(&mut self.destroy_requested, true)
    }

    pub fn destroy_requested(&self) -> bool {
        self.destroy_requested
    }
}
