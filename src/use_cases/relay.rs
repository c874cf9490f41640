// Relay session registry: membership and the per-session fan-out channel.

use crate::domain::PeerId;
use axum::extract::ws::Utf8Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};

/// Errors returned by relay registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    /// The peer id already has a live connection in this session.
    #[error("peer already connected to this session")]
    PeerAlreadyConnected,
}

/// Shared handle for one relayed session.
#[derive(Clone)]
pub struct RelayHandle {
    /// Identifier peers use to target this session.
    pub session_id: Arc<str>,
    /// Serialized frames, delivered to every member including the sender.
    ///
    /// A single sender per session gives all members the same frame order.
    pub frames_tx: broadcast::Sender<Utf8Bytes>,
}

struct RelaySession {
    handle: RelayHandle,
    members: HashSet<PeerId>,
}

/// Thread-safe registry of relayed sessions.
pub struct RelayRegistry {
    /// Broadcast capacity for newly created sessions.
    frame_capacity: usize,
    sessions: RwLock<HashMap<String, RelaySession>>,
}

impl RelayRegistry {
    pub fn new(frame_capacity: usize) -> Self {
        Self {
            frame_capacity,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Adds `peer` to the session, creating the session on first join.
    pub async fn join(&self, session_id: &str, peer: PeerId) -> Result<RelayHandle, RelayError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                let (frames_tx, _frames_rx) = broadcast::channel(self.frame_capacity);
                RelaySession {
                    handle: RelayHandle {
                        session_id: Arc::from(session_id),
                        frames_tx,
                    },
                    members: HashSet::new(),
                }
            });

        if !session.members.insert(peer) {
            return Err(RelayError::PeerAlreadyConnected);
        }
        Ok(session.handle.clone())
    }

    /// Removes `peer`; the session goes away with its last member.
    pub async fn leave(&self, session_id: &str, peer: PeerId) {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_id) else {
            return;
        };
        session.members.remove(&peer);
        if session.members.is_empty() {
            sessions.remove(session_id);
            tracing::info!(session_id, "session empty; removed");
        }
    }

    pub async fn is_member(&self, session_id: &str, peer: PeerId) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .is_some_and(|session| session.members.contains(&peer))
    }

    /// Sorted member list, or None if the session does not exist.
    pub async fn members(&self, session_id: &str) -> Option<Vec<PeerId>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|session| {
            let mut members: Vec<PeerId> = session.members.iter().copied().collect();
            members.sort();
            members
        })
    }
}
