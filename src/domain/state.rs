// Replicated per-entity state and its fixed positional wire order.

/// Slow-changing avatar attributes replicated from the authority peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicatedState {
    pub health: i32,
    pub ammo: u32,
    pub invincible: bool,
    pub down: bool,
}

/// Field order on the wire: health, ammo, invincible, down.
pub type StateTuple = (i32, u32, bool, bool);

impl ReplicatedState {
    pub fn spawned(max_health: i32, ammo: u32) -> Self {
        Self {
            health: max_health,
            ammo,
            invincible: false,
            down: false,
        }
    }
}

impl From<ReplicatedState> for StateTuple {
    fn from(state: ReplicatedState) -> Self {
        (state.health, state.ammo, state.invincible, state.down)
    }
}

impl From<StateTuple> for ReplicatedState {
    fn from((health, ammo, invincible, down): StateTuple) -> Self {
        Self {
            health,
            ammo,
            invincible,
            down,
        }
    }
}
