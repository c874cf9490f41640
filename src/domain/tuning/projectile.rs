use std::time::Duration;

/// Gameplay tuning for projectiles.
#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Horizontal speed in world units per second.
    pub speed: f32,

    /// Lifetime before the projectile destroys itself.
    pub life_time: Duration,

    /// Collision radius in world units.
    pub radius: f32,

    /// Health removed from the target on impact.
    pub damage: i32,

    /// Vertical offset every projectile is placed at when spawned.
    pub spawn_height: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 12.0,
            life_time: Duration::from_secs(2),
            radius: 0.1,
            damage: 10,
            spawn_height: 0.5,
        }
    }
}
