// Per-peer replicated world: entity table, event dispatch and the simulation tick.
//
// Local triggers never mutate shared state directly. They queue an event in the outbox; the
// relay echoes it to every peer (this one included) and `dispatch` applies it the same way
// everywhere.

use super::types::{
    DamageSource, Envelope, PeerMessage, SessionEvent, StateFrame, TransformFrame, VictimKind,
};
use crate::domain::ports::RenderSink;
use crate::domain::tuning::{EnemyTuning, PlayerTuning, ProjectileTuning};
use crate::domain::{
    Avatar, DamageOutcome, Enemy, EnemyHit, IdentityAllocator, NetworkIdentity, PeerId,
    Projectile, Replica, ReplicatedState, RetiredIds,
};
use glam::Vec3;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
    pub enemy: EnemyTuning,
    /// Periodic state is emitted every this many ticks.
    pub state_send_interval: u64,
    /// Number of destroyed identities remembered to reject stale spawns and damage.
    pub retired_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            projectile: ProjectileTuning::default(),
            enemy: EnemyTuning::default(),
            state_send_interval: 6,
            retired_capacity: 4096,
        }
    }
}

pub struct PeerSession {
    local_peer: PeerId,
    ids: IdentityAllocator,
    settings: SessionSettings,

    avatars: BTreeMap<NetworkIdentity, Avatar>,
    enemies: BTreeMap<NetworkIdentity, Enemy>,
    projectiles: BTreeMap<NetworkIdentity, Projectile>,

    // Recently destroyed or consumed identities; late spawns and damage for them are ignored.
    retired: RetiredIds,
    // Live projectiles whose damage has already been applied. Moved to `retired` on destroy.
    credited: HashSet<NetworkIdentity>,

    kills: HashMap<PeerId, u32>,
    enemies_remaining: u32,
    local_avatar: Option<NetworkIdentity>,
    outbox: Vec<PeerMessage>,
    tick: u64,
    time_survived: Duration,
    rendered: Option<ReplicatedState>,
}

impl PeerSession {
    pub fn new(local_peer: PeerId, settings: SessionSettings) -> Self {
        Self {
            local_peer,
            ids: IdentityAllocator::new(local_peer),
            settings,
            avatars: BTreeMap::new(),
            enemies: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            retired: RetiredIds::new(settings.retired_capacity),
            credited: HashSet::new(),
            kills: HashMap::new(),
            enemies_remaining: 0,
            local_avatar: None,
            outbox: Vec::new(),
            tick: 0,
            time_survived: Duration::ZERO,
            rendered: None,
        }
    }

    pub fn local_peer(&self) -> PeerId {
        self.local_peer
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn is_authority(&self, entity: NetworkIdentity) -> bool {
        entity.owner() == self.local_peer
    }

    pub fn local_avatar(&self) -> Option<&Avatar> {
        self.local_avatar.and_then(|id| self.avatars.get(&id))
    }

    pub fn local_avatar_id(&self) -> Option<NetworkIdentity> {
        self.local_avatar
    }

    pub fn avatar(&self, entity: NetworkIdentity) -> Option<&Avatar> {
        self.avatars.get(&entity)
    }

    pub fn enemy(&self, entity: NetworkIdentity) -> Option<&Enemy> {
        self.enemies.get(&entity)
    }

    pub fn projectile(&self, entity: NetworkIdentity) -> Option<&Projectile> {
        self.projectiles.get(&entity)
    }

    pub fn contains(&self, entity: NetworkIdentity) -> bool {
        self.avatars.contains_key(&entity)
            || self.enemies.contains_key(&entity)
            || self.projectiles.contains_key(&entity)
    }

    pub fn kills_of(&self, peer: PeerId) -> u32 {
        self.kills.get(&peer).copied().unwrap_or(0)
    }

    pub fn enemies_remaining(&self) -> u32 {
        self.enemies_remaining
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Statistics reported to the persistence service when the game ends.
    pub fn statistics(&self) -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("Time".to_string(), self.time_survived.as_secs() as i64),
            ("Kills".to_string(), self.kills_of(self.local_peer) as i64),
        ])
    }

    /// Drains messages queued for broadcast since the last call.
    pub fn take_outbound(&mut self) -> Vec<PeerMessage> {
        std::mem::take(&mut self.outbox)
    }

    fn emit(&mut self, event: SessionEvent) {
        self.outbox.push(PeerMessage::Event(event));
    }

    // ----- local triggers -----

    /// Allocates an avatar identity owned by this peer and announces it.
    pub fn spawn_avatar(&mut self, position: Vec3) -> NetworkIdentity {
        let entity = self.ids.allocate();
        self.local_avatar = Some(entity);
        self.emit(SessionEvent::SpawnAvatar { entity, position });
        entity
    }

    pub fn spawn_enemy(&mut self, position: Vec3) -> NetworkIdentity {
        let entity = self.ids.allocate();
        let health = self.settings.enemy.max_health;
        self.emit(SessionEvent::SpawnEnemy {
            entity,
            position,
            health,
        });
        entity
    }

    /// Fires from the local avatar if it is up and has a round loaded.
    pub fn fire(&mut self, direction: Vec3) -> Option<NetworkIdentity> {
        let avatar = self.local_avatar.and_then(|id| self.avatars.get_mut(&id))?;
        if avatar.state().down || !avatar.fire() {
            return None;
        }
        let origin = avatar.position;
        let entity = self.ids.allocate();
        self.emit(SessionEvent::SpawnProjectile {
            entity,
            origin,
            direction,
        });
        Some(entity)
    }

    pub fn move_local(&mut self, position: Vec3) {
        if let Some(avatar) = self.local_avatar.and_then(|id| self.avatars.get_mut(&id)) {
            avatar.position = position;
        }
    }

    /// Broadcasts a destroy. The entity is removed when the event comes back.
    pub fn destroy(&mut self, entity: NetworkIdentity) {
        if let Some(projectile) = self.projectiles.get_mut(&entity) {
            if !projectile.request_destroy() {
                return;
            }
        }
        self.emit(SessionEvent::Destroy { entity });
    }

    /// Entry point for damage decided outside the projectile path (enemy attacks).
    pub fn request_damage(
        &mut self,
        target: NetworkIdentity,
        amount: i32,
        source: DamageSource,
    ) {
        self.emit(SessionEvent::DamageApplied {
            target,
            amount,
            source,
        });
    }

    pub fn heal_local(&mut self, amount: i32) -> Option<i32> {
        self.local_avatar
            .and_then(|id| self.avatars.get_mut(&id))?
            .heal(amount)
    }

    pub fn reload_local(&mut self, rounds: u32) -> Option<u32> {
        let capacity = self.settings.player.magazine_capacity;
        self.local_avatar
            .and_then(|id| self.avatars.get_mut(&id))?
            .reload(rounds, capacity)
    }

    pub fn set_getting_up(&mut self, getting_up: bool) {
        let tuning = self.settings.player;
        if let Some(avatar) = self.local_avatar.and_then(|id| self.avatars.get_mut(&id)) {
            avatar.set_getting_up(getting_up, &tuning);
        }
    }

    // ----- inbound -----

    /// Applies one relayed message and refreshes the render sink.
    pub fn receive(&mut self, envelope: Envelope, sink: &mut dyn RenderSink) {
        match envelope.message {
            PeerMessage::Event(event) => self.dispatch(envelope.sender, event),
            PeerMessage::State(frame) => self.apply_state_frame(frame),
            PeerMessage::Transform(frame) => self.apply_transform(frame),
        }
        self.render_local(sink);
    }

    /// Single handler for every broadcast event, whichever peer sent it.
    pub fn dispatch(&mut self, sender: PeerId, event: SessionEvent) {
        match event {
            SessionEvent::SpawnAvatar { entity, position } => {
                if self.retired.contains(&entity) || self.avatars.contains_key(&entity) {
                    return;
                }
                let state = ReplicatedState::spawned(
                    self.settings.player.max_health,
                    self.settings.player.magazine_capacity,
                );
                let replica = Replica::for_entity(self.local_peer, entity, state);
                self.avatars.insert(
                    entity,
                    Avatar::new(replica, position, &self.settings.player),
                );
                info!(entity = %entity, sender = %sender, "avatar spawned");
            }
            SessionEvent::SpawnEnemy {
                entity,
                position,
                health,
            } => {
                if self.retired.contains(&entity) || self.enemies.contains_key(&entity) {
                    return;
                }
                self.enemies.insert(
                    entity,
                    Enemy {
                        health,
                        position,
                        radius: self.settings.enemy.radius,
                    },
                );
                self.enemies_remaining += 1;
                debug!(entity = %entity, "enemy spawned");
            }
            SessionEvent::SpawnProjectile {
                entity,
                origin,
                direction,
            } => {
                if self.retired.contains(&entity) || self.projectiles.contains_key(&entity) {
                    return;
                }
                let projectile =
                    Projectile::spawn(entity.owner(), origin, direction, &self.settings.projectile);
                self.projectiles.insert(entity, projectile);
            }
            SessionEvent::Destroy { entity } => self.remove_entity(entity),
            SessionEvent::DamageApplied {
                target,
                amount,
                source,
            } => self.resolve_damage(target, amount, source),
            SessionEvent::KillCounted { killer, victim } => {
                *self.kills.entry(killer).or_default() += 1;
                if victim == VictimKind::Enemy {
                    self.enemies_remaining = self.enemies_remaining.saturating_sub(1);
                }
                info!(killer = %killer, ?victim, "kill counted");
            }
            SessionEvent::PeerJoined { peer } => {
                if peer != self.local_peer {
                    info!(peer_id = %peer, "peer joined; announcing owned entities");
                    self.announce_owned();
                }
            }
            SessionEvent::PeerLeft { peer } => self.remove_owned_by(peer),
        }
    }

    fn remove_entity(&mut self, entity: NetworkIdentity) {
        let removed = self.projectiles.remove(&entity).is_some()
            || self.enemies.remove(&entity).is_some()
            || self.avatars.remove(&entity).is_some();

        if !removed {
            debug!(entity = %entity, "destroy for absent entity ignored");
            return;
        }
        self.retired.insert(entity);
        self.credited.remove(&entity);
        if self.local_avatar == Some(entity) {
            self.local_avatar = None;
            self.rendered = None;
        }
        debug!(entity = %entity, "entity destroyed");
    }

    // Every peer applies the damage to its copy; only the target's owner decides kills.
    fn resolve_damage(&mut self, target: NetworkIdentity, amount: i32, source: DamageSource) {
        let killer = match source {
            DamageSource::Projectile(projectile) => {
                if !self.accept_projectile_damage(projectile) {
                    debug!(projectile = %projectile, target = %target, "duplicate impact absorbed");
                    return;
                }
                Some(projectile.owner())
            }
            DamageSource::Direct(_) => None,
        };
        let decides = self.is_authority(target);

        if let Some(avatar) = self.avatars.get_mut(&target) {
            let outcome = avatar.apply_damage(amount, self.settings.player.invincibility);
            debug!(target = %target, ?outcome, "damage applied to avatar");
            if outcome == DamageOutcome::Downed && decides {
                info!(target = %target, "avatar down");
                if let Some(killer) = killer {
                    self.emit(SessionEvent::KillCounted {
                        killer,
                        victim: VictimKind::Avatar,
                    });
                }
            }
            return;
        }

        if let Some(enemy) = self.enemies.get_mut(&target) {
            let hit = enemy.take_damage(amount);
            debug!(target = %target, ?hit, "damage applied to enemy");
            if hit == EnemyHit::Killed && decides {
                if let Some(killer) = killer {
                    self.emit(SessionEvent::KillCounted {
                        killer,
                        victim: VictimKind::Enemy,
                    });
                }
                self.emit(SessionEvent::Destroy { entity: target });
            }
            return;
        }

        debug!(target = %target, "damage for absent target ignored");
    }

    // First damage per projectile wins. A projectile this peer never saw is consumed on the spot.
    fn accept_projectile_damage(&mut self, projectile: NetworkIdentity) -> bool {
        if self.retired.contains(&projectile) || self.credited.contains(&projectile) {
            return false;
        }
        if self.projectiles.contains_key(&projectile) {
            self.credited.insert(projectile);
        } else {
            self.retired.insert(projectile);
        }
        true
    }

    fn apply_state_frame(&mut self, frame: StateFrame) {
        match self.avatars.get_mut(&frame.entity) {
            Some(avatar) => {
                avatar.replica.overwrite(frame.state);
            }
            None => debug!(entity = %frame.entity, "state for absent entity ignored"),
        }
    }

    fn apply_transform(&mut self, frame: TransformFrame) {
        if self.is_authority(frame.entity) {
            return;
        }
        if let Some(avatar) = self.avatars.get_mut(&frame.entity) {
            avatar.position = frame.position;
        } else if let Some(enemy) = self.enemies.get_mut(&frame.entity) {
            enemy.position = frame.position;
        }
    }

    /// Re-broadcasts spawns (and current state) for everything this peer owns.
    fn announce_owned(&mut self) {
        let mut messages = Vec::new();
        for (&entity, avatar) in self.avatars.iter().filter(|(_, a)| a.is_authority()) {
            messages.push(PeerMessage::Event(SessionEvent::SpawnAvatar {
                entity,
                position: avatar.position,
            }));
            messages.push(PeerMessage::State(StateFrame {
                entity,
                state: *avatar.state(),
            }));
        }
        for (&entity, enemy) in self.enemies.iter() {
            if entity.owner() == self.local_peer {
                messages.push(PeerMessage::Event(SessionEvent::SpawnEnemy {
                    entity,
                    position: enemy.position,
                    health: enemy.health,
                }));
            }
        }
        self.outbox.extend(messages);
    }

    fn remove_owned_by(&mut self, peer: PeerId) {
        let before = self.enemies.len();
        self.avatars.retain(|id, _| id.owner() != peer);
        self.enemies.retain(|id, _| id.owner() != peer);
        self.projectiles.retain(|id, _| id.owner() != peer);
        self.credited.retain(|id| id.owner() != peer);
        self.retired.forget_owner(peer);
        let enemies_removed = (before - self.enemies.len()) as u32;
        self.enemies_remaining = self.enemies_remaining.saturating_sub(enemies_removed);
        info!(peer_id = %peer, "peer left; owned entities removed");
    }

    // ----- simulation tick -----

    /// Advances timers, movement and collision by one tick and queues periodic state.
    pub fn tick(&mut self, dt: Duration, sink: &mut dyn RenderSink) {
        self.tick += 1;
        self.time_survived += dt;

        let player_tuning = self.settings.player;
        for (entity, avatar) in self.avatars.iter_mut() {
            if avatar.tick(dt, &player_tuning) {
                info!(entity = %entity, "avatar got up");
            }
        }

        self.advance_projectiles(dt);
        self.detect_collisions();

        if self.tick % self.settings.state_send_interval.max(1) == 0 {
            self.emit_periodic_state();
        }

        self.render_local(sink);
    }

    fn advance_projectiles(&mut self, dt: Duration) {
        let local_peer = self.local_peer;
        let mut expired = Vec::new();
        for (&entity, projectile) in self.projectiles.iter_mut() {
            let lifetime_over = projectile.advance(dt);
            // Expiry is decided by the owner only; removal still happens through `Destroy`.
            if lifetime_over && entity.owner() == local_peer && projectile.request_destroy() {
                expired.push(entity);
            }
        }
        for entity in expired {
            debug!(entity = %entity, "projectile lifetime over");
            self.emit(SessionEvent::Destroy { entity });
        }
    }

    fn detect_collisions(&mut self) {
        let player_radius = self.settings.player.radius;
        let damage = self.settings.projectile.damage;
        let mut impacts = Vec::new();

        for (&projectile_id, projectile) in self.projectiles.iter_mut() {
            if projectile.destroy_requested() || projectile.remaining_life().is_zero() {
                continue;
            }

            let avatar_hit = self
                .avatars
                .iter()
                .find(|(id, avatar)| {
                    id.owner() != projectile.owner
                        && !avatar.state().down
                        && projectile.overlaps(avatar.position, player_radius)
                })
                .map(|(id, _)| *id);
            let target = avatar_hit.or_else(|| {
                self.enemies
                    .iter()
                    .find(|(_, enemy)| {
                        enemy.health > 0 && projectile.overlaps(enemy.position, enemy.radius)
                    })
                    .map(|(id, _)| *id)
            });

            if let Some(target) = target {
                projectile.request_destroy();
                impacts.push((projectile_id, target));
            }
        }

        for (projectile, target) in impacts {
            debug!(projectile = %projectile, target = %target, "impact detected");
            self.emit(SessionEvent::DamageApplied {
                target,
                amount: damage,
                source: DamageSource::Projectile(projectile),
            });
            self.emit(SessionEvent::Destroy { entity: projectile });
        }
    }

    fn emit_periodic_state(&mut self) {
        let mut messages = Vec::new();
        for (&entity, avatar) in self.avatars.iter().filter(|(_, a)| a.is_authority()) {
            messages.push(PeerMessage::State(StateFrame {
                entity,
                state: *avatar.state(),
            }));
            messages.push(PeerMessage::Transform(TransformFrame {
                entity,
                position: avatar.position,
            }));
        }
        for (&entity, enemy) in self.enemies.iter() {
            if entity.owner() == self.local_peer {
                messages.push(PeerMessage::Transform(TransformFrame {
                    entity,
                    position: enemy.position,
                }));
            }
        }
        self.outbox.extend(messages);
    }

    /// Pushes changed local avatar values to the render sink.
    fn render_local(&mut self, sink: &mut dyn RenderSink) {
        let Some(state) = self.local_avatar().map(|a| *a.state()) else {
            return;
        };
        let previous = self.rendered.replace(state);
        if previous.map(|p| p.health) != Some(state.health) {
            sink.set_health(state.health);
        }
        if previous.map(|p| p.ammo) != Some(state.ammo) {
            sink.set_ammo(self.settings.player.magazine_capacity, state.ammo);
        }
    }
}
