use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::PeerId;
use crate::domain::ports::{
    CurrencyRequest, ItemKind, PersistenceError, PersistenceService, PlayerInfo,
    PlayerInfoRequest, RenderSink,
};
use crate::use_cases::session::{PeerSession, SessionSettings};
use crate::use_cases::types::{Envelope, PeerMessage, SessionEvent};

// Render sink that records every call in order.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingSink {
    pub health: Vec<i32>,
    pub ammo: Vec<(u32, u32)>,
    pub coins: Vec<String>,
    pub medkits: Vec<String>,
}

impl RenderSink for RecordingSink {
    fn set_health(&mut self, health: i32) {
        self.health.push(health);
    }

    fn set_ammo(&mut self, capacity: u32, ammo: u32) {
        self.ammo.push((capacity, ammo));
    }

    fn set_coin_text(&mut self, text: String) {
        self.coins.push(text);
    }

    fn set_medkit_text(&mut self, text: String) {
        self.medkits.push(text);
    }
}

// Sink handle the test keeps while a task owns the other clone.
#[derive(Clone, Default)]
pub(crate) struct SharedSink(pub Arc<Mutex<RecordingSink>>);

impl SharedSink {
    pub(crate) fn snapshot(&self) -> RecordingSink {
        self.0.lock().expect("sink mutex poisoned").clone()
    }
}

impl RenderSink for SharedSink {
    fn set_health(&mut self, health: i32) {
        self.0.lock().expect("sink mutex poisoned").set_health(health);
    }

    fn set_ammo(&mut self, capacity: u32, ammo: u32) {
        self.0
            .lock()
            .expect("sink mutex poisoned")
            .set_ammo(capacity, ammo);
    }

    fn set_coin_text(&mut self, text: String) {
        self.0.lock().expect("sink mutex poisoned").set_coin_text(text);
    }

    fn set_medkit_text(&mut self, text: String) {
        self.0
            .lock()
            .expect("sink mutex poisoned")
            .set_medkit_text(text);
    }
}

// In-memory relay: delivers every message to every peer (sender included) in one total order.
pub(crate) struct Hub {
    settings: SessionSettings,
    peers: Vec<(PeerId, PeerSession, RecordingSink)>,
}

impl Hub {
    pub(crate) fn new(peers: &[PeerId], settings: SessionSettings) -> Self {
        Self {
            settings,
            peers: peers
                .iter()
                .map(|&id| (id, PeerSession::new(id, settings), RecordingSink::default()))
                .collect(),
        }
    }

    pub(crate) fn peer(&self, id: PeerId) -> &PeerSession {
        &self
            .peers
            .iter()
            .find(|(peer, _, _)| *peer == id)
            .expect("unknown peer")
            .1
    }

    pub(crate) fn peer_mut(&mut self, id: PeerId) -> &mut PeerSession {
        &mut self
            .peers
            .iter_mut()
            .find(|(peer, _, _)| *peer == id)
            .expect("unknown peer")
            .1
    }

    pub(crate) fn sink(&self, id: PeerId) -> &RecordingSink {
        &self
            .peers
            .iter()
            .find(|(peer, _, _)| *peer == id)
            .expect("unknown peer")
            .2
    }

    /// Adds a peer and announces it the way the relay does.
    pub(crate) fn join(&mut self, id: PeerId) {
        self.peers.push((
            id,
            PeerSession::new(id, self.settings),
            RecordingSink::default(),
        ));
        self.deliver(
            id,
            vec![PeerMessage::Event(SessionEvent::PeerJoined { peer: id })],
        );
    }

    /// Drops a peer and announces its departure the way the relay does.
    pub(crate) fn leave(&mut self, id: PeerId) {
        self.peers.retain(|(peer, _, _)| *peer != id);
        self.deliver(
            id,
            vec![PeerMessage::Event(SessionEvent::PeerLeft { peer: id })],
        );
    }

    /// Like `deliver`, but `skipped` never sees the messages.
    pub(crate) fn deliver_except(
        &mut self,
        sender: PeerId,
        skipped: PeerId,
        messages: Vec<PeerMessage>,
    ) {
        for message in messages {
            for (_, session, sink) in self.peers.iter_mut().filter(|(peer, _, _)| *peer != skipped) {
                session.receive(
                    Envelope {
                        sender,
                        message: message.clone(),
                    },
                    sink,
                );
            }
        }
    }

    pub(crate) fn deliver(&mut self, sender: PeerId, messages: Vec<PeerMessage>) {
        for message in messages {
            for (_, session, sink) in self.peers.iter_mut() {
                session.receive(
                    Envelope {
                        sender,
                        message: message.clone(),
                    },
                    sink,
                );
            }
        }
    }

    /// Flushes outboxes until every peer is quiet. Returns everything that was delivered.
    pub(crate) fn pump(&mut self) -> Vec<PeerMessage> {
        let mut delivered = Vec::new();
        loop {
            let mut quiet = true;
            for index in 0..self.peers.len() {
                let sender = self.peers[index].0;
                let outbound = self.peers[index].1.take_outbound();
                if outbound.is_empty() {
                    continue;
                }
                quiet = false;
                delivered.extend(outbound.iter().cloned());
                self.deliver(sender, outbound);
            }
            if quiet {
                return delivered;
            }
        }
    }

    /// Ticks one peer on its own, leaving the others where they are.
    pub(crate) fn tick(&mut self, id: PeerId, dt: std::time::Duration) {
        let (_, session, sink) = self
            .peers
            .iter_mut()
            .find(|(peer, _, _)| *peer == id)
            .expect("unknown peer");
        session.tick(dt, sink);
    }

    pub(crate) fn tick_all(&mut self, dt: std::time::Duration) {
        for (_, session, sink) in self.peers.iter_mut() {
            session.tick(dt, sink);
        }
    }
}

// Delivers a single session's outbox back to itself.
pub(crate) fn echo(session: &mut PeerSession, sink: &mut RecordingSink) {
    let sender = session.local_peer();
    for message in session.take_outbound() {
        session.receive(Envelope { sender, message }, sink);
    }
}

// Persistence fake with queued responses per operation.
#[derive(Clone, Default)]
pub(crate) struct ScriptedService {
    currency: Arc<Mutex<VecDeque<Result<i64, PersistenceError>>>>,
    info: Arc<Mutex<VecDeque<Result<PlayerInfo, PersistenceError>>>>,
    consume: Arc<Mutex<VecDeque<Result<u32, PersistenceError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
    statistics: Arc<Mutex<Vec<BTreeMap<String, i64>>>>,
}

impl ScriptedService {
    pub(crate) fn with_currency(self, response: Result<i64, PersistenceError>) -> Self {
        self.currency
            .lock()
            .expect("script mutex poisoned")
            .push_back(response);
        self
    }

    pub(crate) fn with_info(self, response: Result<PlayerInfo, PersistenceError>) -> Self {
        self.info
            .lock()
            .expect("script mutex poisoned")
            .push_back(response);
        self
    }

    pub(crate) fn with_consume(self, response: Result<u32, PersistenceError>) -> Self {
        self.consume
            .lock()
            .expect("script mutex poisoned")
            .push_back(response);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(crate) fn submitted_statistics(&self) -> Vec<BTreeMap<String, i64>> {
        self.statistics
            .lock()
            .expect("statistics mutex poisoned")
            .clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }
}

#[async_trait]
impl PersistenceService for ScriptedService {
    async fn adjust_currency(&self, request: CurrencyRequest) -> Result<i64, PersistenceError> {
        self.record(format!(
            "adjust_currency {:?} {} {}",
            request.operation,
            request.kind.code(),
            request.amount
        ));
        self.currency
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or(Err(PersistenceError::Unavailable))
    }

    async fn fetch_player_info(
        &self,
        request: PlayerInfoRequest,
    ) -> Result<PlayerInfo, PersistenceError> {
        self.record(format!(
            "fetch_player_info inventory={} currency={}",
            request.get_inventory, request.get_currency
        ));
        self.info
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or(Err(PersistenceError::Unavailable))
    }

    async fn consume_item(&self, item: ItemKind, count: u32) -> Result<u32, PersistenceError> {
        self.record(format!("consume_item {} {}", item.code(), count));
        self.consume
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or(Err(PersistenceError::Unavailable))
    }

    async fn submit_statistics(
        &self,
        statistics: BTreeMap<String, i64>,
    ) -> Result<(), PersistenceError> {
        self.record("submit_statistics".to_string());
        self.statistics
            .lock()
            .expect("statistics mutex poisoned")
            .push(statistics);
        Ok(())
    }
}
