use std::time::Duration;

/// Gameplay tuning for player avatars.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).
#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Health an avatar spawns with; also the heal ceiling.
    pub max_health: i32,

    /// Rounds held by a full magazine.
    pub magazine_capacity: u32,

    /// Horizontal collision radius in world units.
    pub radius: f32,

    /// Damage immunity after a non-lethal hit.
    pub invincibility: Duration,

    /// How long a downed avatar must keep getting up before the down flag clears.
    pub get_up: Duration,

    /// Health restored by one medkit.
    pub medkit_heal: i32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100,
            magazine_capacity: 30,
            radius: 0.5,
            invincibility: Duration::from_secs(1),
            get_up: Duration::from_secs(5),
            medkit_heal: 60,
        }
    }
}
