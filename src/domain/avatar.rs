// Player avatar and its damage state machine.
//
// Phases: Alive, Down. The invincibility window is an overlay flag on Alive.

use super::replica::Replica;
use super::state::ReplicatedState;
use super::timer::Countdown;
use super::tuning::PlayerTuning;
use glam::Vec3;
use std::time::Duration;

/// Result of handling one `DamageApplied` against an avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Inside the invincibility window; health untouched.
    Suppressed,
    /// Avatar already down; health untouched.
    Absorbed,
    /// Health dropped and the invincibility window opened.
    Hit { health: i32 },
    /// Health reached zero and the avatar went down.
    Downed,
}

#[derive(Debug, Clone)]
pub struct Avatar {
    pub replica: Replica<ReplicatedState>,
    pub position: Vec3,
    max_health: i32,

    // Local timers, never serialized.
    invincibility: Countdown,
    get_up: Countdown,
    getting_up: bool,
}

impl Avatar {
    pub fn new(replica: Replica<ReplicatedState>, position: Vec3, tuning: &PlayerTuning) -> Self {
        Self {
            replica,
            position,
            max_health: tuning.max_health,
            invincibility: Countdown::idle(),
            get_up: Countdown::new(tuning.get_up),
            getting_up: false,
        }
    }

    pub fn state(&self) -> &ReplicatedState {
        self.replica.view()
    }

    pub fn is_authority(&self) -> bool {
        self.replica.is_authority()
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Event-path transition; runs identically on every peer.
    ///
    /// The invincibility guard is checked before health is touched.
    pub fn apply_damage(&mut self, amount: i32, window: Duration) -> DamageOutcome {
        let max_health = self.max_health;
        let outcome = self.replica.apply_event(|state| {
            if state.down {
                return DamageOutcome::Absorbed;
            }
            if state.invincible {
                return DamageOutcome::Suppressed;
            }

            state.health = (state.health - amount.max(0)).clamp(0, max_health);
            if state.health == 0 {
                state.down = true;
                DamageOutcome::Downed
            } else {
                state.invincible = true;
                DamageOutcome::Hit {
                    health: state.health,
                }
            }
        });

        if matches!(outcome, DamageOutcome::Hit { .. }) {
            self.invincibility.reset(window);
        }
        outcome
    }

    /// Restores health on the authority peer, clamped to max. Shadows return None.
    pub fn heal(&mut self, amount: i32) -> Option<i32> {
        let max_health = self.max_health;
        let state = self.replica.owned_mut()?;
        state.health = (state.health + amount.max(0)).clamp(0, max_health);
        Some(state.health)
    }

    /// Consumes one round on the authority peer.
    pub fn fire(&mut self) -> bool {
        match self.replica.owned_mut() {
            Some(state) if state.ammo > 0 => {
                state.ammo -= 1;
                true
            }
            _ => false,
        }
    }

    /// Adds rounds to the magazine, never past `capacity`.
    pub fn reload(&mut self, rounds: u32, capacity: u32) -> Option<u32> {
        let state = self.replica.owned_mut()?;
        state.ammo = state.ammo.saturating_add(rounds).min(capacity);
        Some(state.ammo)
    }

    /// Owner-side "being revived" signal. Releasing it restarts the get-up countdown.
    pub fn set_getting_up(&mut self, getting_up: bool, tuning: &PlayerTuning) {
        self.getting_up = getting_up;
        if !getting_up {
            self.get_up.reset(tuning.get_up);
        }
    }

    /// Clears the down flag. Health is left as is.
    pub fn get_up(&mut self) -> bool {
        match self.replica.owned_mut() {
            Some(state) if state.down => {
                state.down = false;
                true
            }
            _ => false,
        }
    }

    /// Advances local timers by one tick. Returns true if the avatar got up on this tick.
    pub fn tick(&mut self, dt: Duration, tuning: &PlayerTuning) -> bool {
        if self.invincibility.tick(dt) {
            self.replica.apply_event(|state| state.invincible = false);
        }

        if !self.is_authority() || !self.state().down {
            return false;
        }
        if !self.getting_up {
            self.get_up.reset(tuning.get_up);
            return false;
        }
        if self.get_up.tick(dt) {
            self.getting_up = false;
            self.get_up.reset(tuning.get_up);
            return self.get_up();
        }
        false
    }
}
