use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Session-scoped identifier of a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network identity of a replicated entity.
///
/// The owning peer lives in the upper 32 bits and a per-owner serial in the lower 32, so the
/// authority for an entity is readable from its id and cannot change for the entity's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkIdentity(u64);

impl NetworkIdentity {
    pub fn new(owner: PeerId, serial: u32) -> Self {
        Self(((owner.0 as u64) << 32) | serial as u64)
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Peer that holds authority over this entity.
    pub fn owner(self) -> PeerId {
        PeerId((self.0 >> 32) as u32)
    }

    pub fn serial(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for NetworkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner(), self.serial())
    }
}

/// Hands out identities for entities spawned by the local peer.
#[derive(Debug)]
pub struct IdentityAllocator {
    owner: PeerId,
    next_serial: u32,
}

impl IdentityAllocator {
    pub fn new(owner: PeerId) -> Self {
        Self {
            owner,
            next_serial: 1,
        }
    }

    pub fn allocate(&mut self) -> NetworkIdentity {
        let id = NetworkIdentity::new(self.owner, self.next_serial);
        self.next_serial = self.next_serial.wrapping_add(1).max(1);
        id
    }
}

/// Tombstones for destroyed identities, keeping only the most recent `capacity` entries.
///
/// Stale spawns and damage for a destroyed entity arrive shortly after its destroy, so old
/// tombstones are evicted first.
#[derive(Debug)]
pub struct RetiredIds {
    capacity: usize,
    order: VecDeque<NetworkIdentity>,
    members: HashSet<NetworkIdentity>,
}

impl RetiredIds {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            members: HashSet::new(),
        }
    }

    pub fn insert(&mut self, id: NetworkIdentity) {
        if !self.members.insert(id) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
    }

    /// Drops every tombstone owned by `owner`, so a rejoining peer can reuse its serials.
    pub fn forget_owner(&mut self, owner: PeerId) {
        self.order.retain(|id| id.owner() != owner);
        self.members.retain(|id| id.owner() != owner);
    }

    pub fn contains(&self, id: &NetworkIdentity) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
