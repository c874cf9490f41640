/// Gameplay tuning for enemies. Their decision making lives outside this crate.
#[derive(Debug, Clone, Copy)]
pub struct EnemyTuning {
    pub max_health: i32,
    pub radius: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            max_health: 30,
            radius: 0.5,
        }
    }
}
