// Wire protocol DTOs and conversions for relay frames.
//
// Events travel as a name plus an ordered argument list; periodic state travels as a
// positional tuple whose field order must not change.

use crate::domain::{NetworkIdentity, PeerId};
use crate::use_cases::{
    DamageSource, Envelope, PeerMessage, SessionEvent, StateFrame, TransformFrame, VictimKind,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Frame a peer sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WireMessage {
    // Discrete event, applied by every peer including the sender.
    Event(EventDto),
    // Periodic state from the authority peer.
    State(StateFrameDto),
    // Periodic position from the authority peer.
    Transform(TransformFrameDto),
}

/// Frame the relay sends to peers: the peer's message stamped with who sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeDto {
    pub sender: u32,
    pub message: WireMessage,
}

/// Named event with positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args")]
pub enum EventDto {
    SpawnAvatar(u64, [f32; 3]),
    SpawnEnemy(u64, [f32; 3], i32),
    SpawnProjectile(u64, [f32; 3], [f32; 3]),
    Destroy((u64,)),
    DamageApplied(u64, i32, DamageSourceDto),
    KillCounted(u32, VictimKindDto),
    PeerJoined((u32,)),
    PeerLeft((u32,)),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSourceDto {
    Projectile(u64),
    Direct(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictimKindDto {
    Avatar,
    Enemy,
}

/// Positional state tuple: health, ammo, invincible, down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFrameDto {
    pub entity: u64,
    pub state: (i32, u32, bool, bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformFrameDto {
    pub entity: u64,
    pub position: [f32; 3],
}

fn id(raw: u64) -> NetworkIdentity {
    NetworkIdentity::from_raw(raw)
}

impl From<SessionEvent> for EventDto {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::SpawnAvatar { entity, position } => {
                EventDto::SpawnAvatar(entity.raw(), position.to_array())
            }
            SessionEvent::SpawnEnemy {
                entity,
                position,
                health,
            } => EventDto::SpawnEnemy(entity.raw(), position.to_array(), health),
            SessionEvent::SpawnProjectile {
                entity,
                origin,
                direction,
            } => EventDto::SpawnProjectile(entity.raw(), origin.to_array(), direction.to_array()),
            SessionEvent::Destroy { entity } => EventDto::Destroy((entity.raw(),)),
            SessionEvent::DamageApplied {
                target,
                amount,
                source,
            } => EventDto::DamageApplied(target.raw(), amount, source.into()),
            SessionEvent::KillCounted { killer, victim } => {
                EventDto::KillCounted(killer.0, victim.into())
            }
            SessionEvent::PeerJoined { peer } => EventDto::PeerJoined((peer.0,)),
            SessionEvent::PeerLeft { peer } => EventDto::PeerLeft((peer.0,)),
        }
    }
}

impl From<EventDto> for SessionEvent {
    fn from(event: EventDto) -> Self {
        match event {
            EventDto::SpawnAvatar(entity, position) => SessionEvent::SpawnAvatar {
                entity: id(entity),
                position: Vec3::from_array(position),
            },
            EventDto::SpawnEnemy(entity, position, health) => SessionEvent::SpawnEnemy {
                entity: id(entity),
                position: Vec3::from_array(position),
                health,
            },
            EventDto::SpawnProjectile(entity, origin, direction) => {
                SessionEvent::SpawnProjectile {
                    entity: id(entity),
                    origin: Vec3::from_array(origin),
                    direction: Vec3::from_array(direction),
                }
            }
            EventDto::Destroy((entity,)) => SessionEvent::Destroy { entity: id(entity) },
            EventDto::DamageApplied(target, amount, source) => SessionEvent::DamageApplied {
                target: id(target),
                amount,
                source: source.into(),
            },
            EventDto::KillCounted(killer, victim) => SessionEvent::KillCounted {
                killer: PeerId(killer),
                victim: victim.into(),
            },
            EventDto::PeerJoined((peer,)) => SessionEvent::PeerJoined { peer: PeerId(peer) },
            EventDto::PeerLeft((peer,)) => SessionEvent::PeerLeft { peer: PeerId(peer) },
        }
    }
}

impl From<DamageSource> for DamageSourceDto {
    fn from(source: DamageSource) -> Self {
        match source {
            DamageSource::Projectile(entity) => DamageSourceDto::Projectile(entity.raw()),
            DamageSource::Direct(entity) => DamageSourceDto::Direct(entity.raw()),
        }
    }
}

impl From<DamageSourceDto> for DamageSource {
    fn from(source: DamageSourceDto) -> Self {
        match source {
            DamageSourceDto::Projectile(raw) => DamageSource::Projectile(id(raw)),
            DamageSourceDto::Direct(raw) => DamageSource::Direct(id(raw)),
        }
    }
}

impl From<VictimKind> for VictimKindDto {
    fn from(kind: VictimKind) -> Self {
        match kind {
            VictimKind::Avatar => VictimKindDto::Avatar,
            VictimKind::Enemy => VictimKindDto::Enemy,
        }
    }
}

impl From<VictimKindDto> for VictimKind {
    fn from(kind: VictimKindDto) -> Self {
        match kind {
            VictimKindDto::Avatar => VictimKind::Avatar,
            VictimKindDto::Enemy => VictimKind::Enemy,
        }
    }
}

impl From<PeerMessage> for WireMessage {
    fn from(message: PeerMessage) -> Self {
        match message {
            PeerMessage::Event(event) => WireMessage::Event(event.into()),
            PeerMessage::State(frame) => WireMessage::State(StateFrameDto {
                entity: frame.entity.raw(),
                state: frame.state.into(),
            }),
            PeerMessage::Transform(frame) => WireMessage::Transform(TransformFrameDto {
                entity: frame.entity.raw(),
                position: frame.position.to_array(),
            }),
        }
    }
}

impl From<WireMessage> for PeerMessage {
    fn from(message: WireMessage) -> Self {
        match message {
            WireMessage::Event(event) => PeerMessage::Event(event.into()),
            WireMessage::State(frame) => PeerMessage::State(StateFrame {
                entity: id(frame.entity),
                state: frame.state.into(),
            }),
            WireMessage::Transform(frame) => PeerMessage::Transform(TransformFrame {
                entity: id(frame.entity),
                position: Vec3::from_array(frame.position),
            }),
        }
    }
}

impl From<EnvelopeDto> for Envelope {
    fn from(envelope: EnvelopeDto) -> Self {
        Self {
            sender: PeerId(envelope.sender),
            message: envelope.message.into(),
        }
    }
}
