// Use-case level messages exchanged between peers and fed in by the local player.

use crate::domain::{NetworkIdentity, PeerId, ReplicatedState};
use glam::Vec3;

/// What caused a `DamageApplied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    /// Impact of a projectile. Credited at most once per projectile.
    Projectile(NetworkIdentity),
    /// Attack by another entity (enemy AI). Not deduplicated.
    Direct(NetworkIdentity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictimKind {
    Avatar,
    Enemy,
}

/// Discrete events delivered to every peer, the sender included.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SpawnAvatar {
        entity: NetworkIdentity,
        position: Vec3,
    },
    SpawnEnemy {
        entity: NetworkIdentity,
        position: Vec3,
        health: i32,
    },
    SpawnProjectile {
        entity: NetworkIdentity,
        origin: Vec3,
        direction: Vec3,
    },
    Destroy {
        entity: NetworkIdentity,
    },
    DamageApplied {
        target: NetworkIdentity,
        amount: i32,
        source: DamageSource,
    },
    KillCounted {
        killer: PeerId,
        victim: VictimKind,
    },
    PeerJoined {
        peer: PeerId,
    },
    PeerLeft {
        peer: PeerId,
    },
}

/// Periodic state sent by the authority peer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateFrame {
    pub entity: NetworkIdentity,
    pub state: ReplicatedState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformFrame {
    pub entity: NetworkIdentity,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeerMessage {
    Event(SessionEvent),
    State(StateFrame),
    Transform(TransformFrame),
}

/// A message as delivered by the relay, stamped with its sender.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub sender: PeerId,
    pub message: PeerMessage,
}

/// Local player actions fed into the peer loop.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalCommand {
    SpawnAvatar { position: Vec3 },
    SpawnEnemy { position: Vec3 },
    Move { position: Vec3 },
    Fire { direction: Vec3 },
    ApplyDamage {
        target: NetworkIdentity,
        attacker: NetworkIdentity,
        amount: i32,
    },
    SetGettingUp(bool),
    Reload,
    UseMedkit,
    CollectCoin { amount: u32 },
    FinishGame,
    RecordWin,
}
