use super::identity::{NetworkIdentity, PeerId};

/// Ownership-tagged value.
///
/// The authority peer holds `Authority` and is the only one allowed direct local mutation.
/// Every other peer holds a `Shadow`, which is read-only except for wholesale overwrites from
/// the periodic state channel and the transitions driven by broadcast events (which run on all
/// peers alike).
#[derive(Debug, Clone, PartialEq)]
pub enum Replica<T> {
    Authority(T),
    Shadow(T),
}

impl<T> Replica<T> {
    /// Picks the variant for `entity` as seen from `local`.
    pub fn for_entity(local: PeerId, entity: NetworkIdentity, value: T) -> Self {
        if entity.owner() == local {
            Replica::Authority(value)
        } else {
            Replica::Shadow(value)
        }
    }

    pub fn is_authority(&self) -> bool {
        matches!(self, Replica::Authority(_))
    }

    pub fn view(&self) -> &T {
        match self {
            Replica::Authority(value) | Replica::Shadow(value) => value,
        }
    }

    /// Direct mutation, only available on the authority peer.
    pub fn owned_mut(&mut self) -> Option<&mut T> {
        match self {
            Replica::Authority(value) => Some(value),
            Replica::Shadow(_) => None,
        }
    }

    /// Runs an event handler against the local copy, whatever its ownership.
    pub fn apply_event<R>(&mut self, handler: impl FnOnce(&mut T) -> R) -> R {
        match self {
            Replica::Authority(value) | Replica::Shadow(value) => handler(value),
        }
    }

    /// Replaces a shadow copy wholesale. The authority keeps its own value and returns false.
    pub fn overwrite(&mut self, incoming: T) -> bool {
        match self {
            Replica::Authority(_) => false,
            Replica::Shadow(value) => {
                *value = incoming;
                true
            }
        }
    }
}
