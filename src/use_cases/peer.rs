// Per-peer cooperative loop: relay input, local commands and persistence continuations are
// all applied between fixed-rate ticks, never concurrently with the simulation.

use super::profile::{ProfileCache, ProfileClient, ProfileOutcome, apply_outcome};
use super::session::PeerSession;
use super::types::{DamageSource, Envelope, LocalCommand, PeerMessage};
use crate::domain::ports::{CurrencyKind, ItemKind, PlayerInfoRequest, RenderSink};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info, warn};

pub struct PeerChannels {
    /// Local player actions.
    pub commands_rx: mpsc::Receiver<LocalCommand>,
    /// Relay frames, already stamped with their sender.
    pub inbound_rx: mpsc::Receiver<Envelope>,
    /// Messages for the relay to fan out.
    pub outbound_tx: mpsc::Sender<PeerMessage>,
    /// Persistence responses.
    pub outcomes_rx: mpsc::Receiver<ProfileOutcome>,
}

pub async fn peer_task<S: RenderSink>(
    mut session: PeerSession,
    profile: ProfileClient,
    mut sink: S,
    mut channels: PeerChannels,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut cache = ProfileCache::default();
    let mut interval = tokio::time::interval(tick_interval);

    // Initial inventory and currency for the UI.
    profile.refresh(PlayerInfoRequest {
        get_inventory: true,
        get_currency: true,
    });

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!(peer_id = %session.local_peer(), "peer loop shutting down");
                break;
            }
            _ = interval.tick() => {}
        }

        loop {
            match channels.inbound_rx.try_recv() {
                Ok(envelope) => session.receive(envelope, &mut sink),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("relay link closed; peer loop exiting");
                    return;
                }
            }
        }

        while let Ok(command) = channels.commands_rx.try_recv() {
            handle_command(command, &mut session, &cache, &profile);
        }

        while let Ok(outcome) = channels.outcomes_rx.try_recv() {
            apply_outcome(outcome, &mut session, &mut cache, &profile, &mut sink);
        }

        session.tick(tick_interval, &mut sink);

        for message in session.take_outbound() {
            if channels.outbound_tx.send(message).await.is_err() {
                warn!("relay link closed; peer loop exiting");
                return;
            }
        }
    }
}

fn handle_command(
    command: LocalCommand,
    session: &mut PeerSession,
    cache: &ProfileCache,
    profile: &ProfileClient,
) {
    match command {
        LocalCommand::SpawnAvatar { position } => {
            let entity = session.spawn_avatar(position);
            info!(entity = %entity, "spawning local avatar");
        }
        LocalCommand::SpawnEnemy { position } => {
            let entity = session.spawn_enemy(position);
            debug!(entity = %entity, "spawning enemy");
        }
        LocalCommand::Move { position } => session.move_local(position),
        LocalCommand::Fire { direction } => {
            if session.fire(direction).is_none() {
                debug!("fire ignored: no avatar, avatar down or magazine empty");
            }
        }
        LocalCommand::ApplyDamage {
            target,
            attacker,
            amount,
        } => session.request_damage(target, amount, DamageSource::Direct(attacker)),
        LocalCommand::SetGettingUp(getting_up) => session.set_getting_up(getting_up),
        LocalCommand::Reload => {
            let capacity = session.settings().player.magazine_capacity;
            let Some(loaded) = session.local_avatar().map(|a| a.state().ammo) else {
                return;
            };
            let missing = capacity.saturating_sub(loaded);
            match cache.ammo_reserve() {
                Some(reserve) if reserve > 0 && missing > 0 => {
                    profile.consume_item(ItemKind::Ammo, missing.min(reserve));
                }
                _ => debug!(loaded, "nothing to reload"),
            }
        }
        LocalCommand::UseMedkit => {
            let hurt = session
                .local_avatar()
                .is_some_and(|a| a.state().health < a.max_health());
            if hurt {
                profile.consume_item(ItemKind::Medkit, 1);
            }
        }
        LocalCommand::CollectCoin { amount } => {
            profile.adjust_currency(CurrencyKind::Coins, i64::from(amount));
        }
        LocalCommand::FinishGame => profile.submit_statistics(session.statistics()),
        LocalCommand::RecordWin => {
            profile.submit_statistics(BTreeMap::from([("Wins".to_string(), 1)]));
        }
    }
}
