use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyHit {
    Hit { health: i32 },
    Killed,
    AlreadyDead,
}

/// Damageable non-player target. Owned by the peer that spawned it.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub health: i32,
    pub position: Vec3,
    pub radius: f32,
}

impl Enemy {
    pub fn take_damage(&mut self, amount: i32) -> EnemyHit {
        if self.health <= 0 {
            return EnemyHit::AlreadyDead;
        }
        self.health = (self.health - amount.max(0)).max(0);
        if self.health == 0 {
            EnemyHit::Killed
        } else {
            EnemyHit::Hit {
                health: self.health,
            }
        }
    }
}
