// Remote persistence requests and their continuations on the peer loop.
//
// Requests run as detached tasks; their results come back as `ProfileOutcome` values that the
// peer loop applies between ticks. Only server responses are committed to the cache.

use super::session::PeerSession;
use crate::domain::ports::{
    CurrencyKind, CurrencyRequest, ItemKind, PersistenceError, PersistenceService, PlayerInfo,
    PlayerInfoRequest, RenderSink,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileOutcome {
    CurrencyAdjusted {
        kind: CurrencyKind,
        result: Result<i64, PersistenceError>,
    },
    PlayerInfoFetched(Result<PlayerInfo, PersistenceError>),
    ItemConsumed {
        item: ItemKind,
        count: u32,
        result: Result<u32, PersistenceError>,
    },
    StatisticsSubmitted(Result<(), PersistenceError>),
}

/// Fire-and-forget front for the persistence service.
#[derive(Clone)]
pub struct ProfileClient {
    service: Arc<dyn PersistenceService>,
    outcomes_tx: mpsc::Sender<ProfileOutcome>,
}

impl ProfileClient {
    pub fn new(
        service: Arc<dyn PersistenceService>,
        outcomes_tx: mpsc::Sender<ProfileOutcome>,
    ) -> Self {
        Self {
            service,
            outcomes_tx,
        }
    }

    pub fn adjust_currency(&self, kind: CurrencyKind, delta: i64) {
        let service = self.service.clone();
        let request = CurrencyRequest::from_delta(kind, delta);
        self.spawn(async move {
            ProfileOutcome::CurrencyAdjusted {
                kind,
                result: service.adjust_currency(request).await,
            }
        });
    }

    pub fn refresh(&self, request: PlayerInfoRequest) {
        let service = self.service.clone();
        self.spawn(async move {
            ProfileOutcome::PlayerInfoFetched(service.fetch_player_info(request).await)
        });
    }

    pub fn consume_item(&self, item: ItemKind, count: u32) {
        let service = self.service.clone();
        self.spawn(async move {
            ProfileOutcome::ItemConsumed {
                item,
                count,
                result: service.consume_item(item, count).await,
            }
        });
    }

    pub fn submit_statistics(&self, statistics: BTreeMap<String, i64>) {
        let service = self.service.clone();
        self.spawn(async move {
            ProfileOutcome::StatisticsSubmitted(service.submit_statistics(statistics).await)
        });
    }

    fn spawn(&self, request: impl Future<Output = ProfileOutcome> + Send + 'static) {
        let outcomes_tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let outcome = request.await;
            if outcomes_tx.send(outcome).await.is_err() {
                debug!("peer loop gone; profile outcome dropped");
            }
        });
    }
}

/// Last values confirmed by the persistence service. `None` means not fetched yet.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProfileCache {
    coins: Option<i64>,
    medkits: Option<u32>,
    ammo_reserve: Option<u32>,
}

impl ProfileCache {
    pub fn coins(&self) -> Option<i64> {
        self.coins
    }

    pub fn medkits(&self) -> Option<u32> {
        self.medkits
    }

    pub fn ammo_reserve(&self) -> Option<u32> {
        self.ammo_reserve
    }

    fn commit_currency(&mut self, kind: CurrencyKind, balance: i64, sink: &mut dyn RenderSink) {
        match kind {
            CurrencyKind::Coins => {
                self.coins = Some(balance);
                sink.set_coin_text(balance.to_string());
            }
        }
    }

    fn commit_item(&mut self, item: ItemKind, remaining: u32, sink: &mut dyn RenderSink) {
        match item {
            ItemKind::Medkit => {
                self.medkits = Some(remaining);
                sink.set_medkit_text(remaining.to_string());
            }
            ItemKind::Ammo => self.ammo_reserve = Some(remaining),
        }
    }

    fn commit_info(&mut self, info: PlayerInfo, sink: &mut dyn RenderSink) {
        match info.inventory {
            Some(inventory) => {
                for (item, remaining) in inventory {
                    self.commit_item(item, remaining, sink);
                }
            }
            None => debug!("no player inventory in response"),
        }
        if let Some(currency) = info.currency {
            for (kind, balance) in currency {
                self.commit_currency(kind, balance, sink);
            }
        }
    }
}

/// Applies one persistence response on the peer loop.
///
/// Failures are logged and leave local state as it was; nothing is retried.
pub fn apply_outcome(
    outcome: ProfileOutcome,
    session: &mut PeerSession,
    cache: &mut ProfileCache,
    client: &ProfileClient,
    sink: &mut dyn RenderSink,
) {
    match outcome {
        ProfileOutcome::CurrencyAdjusted {
            kind,
            result: Ok(balance),
        } => {
            info!(currency = kind.code(), balance, "currency adjusted");
            cache.commit_currency(kind, balance, sink);
            client.refresh(PlayerInfoRequest {
                get_inventory: false,
                get_currency: true,
            });
        }
        ProfileOutcome::CurrencyAdjusted {
            kind,
            result: Err(e),
        } => {
            warn!(currency = kind.code(), error = %e, "currency adjustment failed");
        }
        ProfileOutcome::PlayerInfoFetched(Ok(info)) => cache.commit_info(info, sink),
        ProfileOutcome::PlayerInfoFetched(Err(e)) => {
            warn!(error = %e, "player info fetch failed");
        }
        ProfileOutcome::ItemConsumed {
            item,
            count,
            result: Ok(remaining),
        } => {
            match item {
                ItemKind::Medkit => {
                    let heal = session.settings().player.medkit_heal;
                    let health = session.heal_local(heal);
                    info!(?health, "medkit used");
                }
                ItemKind::Ammo => {
                    let ammo = session.reload_local(count);
                    info!(?ammo, "magazine reloaded");
                }
            }
            cache.commit_item(item, remaining, sink);
            client.refresh(PlayerInfoRequest {
                get_inventory: true,
                get_currency: false,
            });
        }
        ProfileOutcome::ItemConsumed {
            item,
            result: Err(e),
            ..
        } => {
            warn!(item = item.code(), error = %e, "item use failed");
        }
        ProfileOutcome::StatisticsSubmitted(Ok(())) => info!("statistics submitted"),
        ProfileOutcome::StatisticsSubmitted(Err(e)) => {
            warn!(error = %e, "statistics submission failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PeerId;
    use crate::use_cases::session::SessionSettings;
    use crate::use_cases::test_support::{RecordingSink, ScriptedService, echo};
    use crate::use_cases::types::DamageSource;
    use crate::domain::NetworkIdentity;
    use glam::Vec3;

    struct Fixture {
        session: PeerSession,
        cache: ProfileCache,
        client: ProfileClient,
        outcomes_rx: mpsc::Receiver<ProfileOutcome>,
        sink: RecordingSink,
        service: ScriptedService,
    }

    fn fixture(service: ScriptedService) -> Fixture {
        let (outcomes_tx, outcomes_rx) = mpsc::channel(8);
        let mut session = PeerSession::new(PeerId(1), SessionSettings::default());
        let mut sink = RecordingSink::default();
        session.spawn_avatar(Vec3::ZERO);
        echo(&mut session, &mut sink);
        Fixture {
            session,
            cache: ProfileCache::default(),
            client: ProfileClient::new(Arc::new(service.clone()), outcomes_tx),
            outcomes_rx,
            sink,
            service,
        }
    }

    impl Fixture {
        async fn next_outcome(&mut self) -> ProfileOutcome {
            self.outcomes_rx.recv().await.expect("outcome should arrive")
        }

        fn apply(&mut self, outcome: ProfileOutcome) {
            apply_outcome(
                outcome,
                &mut self.session,
                &mut self.cache,
                &self.client,
                &mut self.sink,
            );
        }
    }

    #[tokio::test]
    async fn when_currency_adjustment_succeeds_then_server_balance_wins_over_local_guess() {
        let service = ScriptedService::default()
            .with_currency(Ok(150))
            .with_info(Ok(PlayerInfo {
                inventory: None,
                currency: Some(BTreeMap::from([(CurrencyKind::Coins, 150)])),
            }));
        let mut f = fixture(service);
        f.cache.commit_currency(CurrencyKind::Coins, 90, &mut f.sink);
        // A local guess would have shown 140 here; nothing commits it.

        f.client.adjust_currency(CurrencyKind::Coins, 50);
        let outcome = f.next_outcome().await;
        f.apply(outcome);

        assert_eq!(f.cache.coins(), Some(150));
        assert_eq!(f.sink.coins.last().map(String::as_str), Some("150"));

        // The mutation is followed by a re-fetch.
        let refresh = f.next_outcome().await;
        assert!(matches!(refresh, ProfileOutcome::PlayerInfoFetched(Ok(_))));
        f.apply(refresh);
        assert_eq!(f.cache.coins(), Some(150));
        assert_eq!(
            f.service.calls(),
            vec![
                "adjust_currency Add CO 50".to_string(),
                "fetch_player_info inventory=false currency=true".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn when_currency_adjustment_fails_then_cache_and_display_are_untouched() {
        let service = ScriptedService::default().with_currency(Err(PersistenceError::Unavailable));
        let mut f = fixture(service);

        f.client.adjust_currency(CurrencyKind::Coins, 50);
        let outcome = f.next_outcome().await;
        f.apply(outcome);

        assert_eq!(f.cache.coins(), None);
        assert!(f.sink.coins.is_empty());
        assert_eq!(f.service.calls().len(), 1);
    }

    #[tokio::test]
    async fn when_medkit_is_consumed_then_local_avatar_heals_and_inventory_refreshes() {
        let service = ScriptedService::default().with_consume(Ok(2));
        let mut f = fixture(service);
        let avatar = f.session.local_avatar_id().expect("avatar spawned");
        let attacker = NetworkIdentity::new(PeerId(2), 1);
        f.session
            .request_damage(avatar, 70, DamageSource::Direct(attacker));
        echo(&mut f.session, &mut f.sink);

        f.client.consume_item(ItemKind::Medkit, 1);
        let outcome = f.next_outcome().await;
        f.apply(outcome);

        assert_eq!(f.session.local_avatar().map(|a| a.state().health), Some(90));
        assert_eq!(f.cache.medkits(), Some(2));
        assert_eq!(f.sink.medkits, vec!["2".to_string()]);
        let refresh = f.next_outcome().await;
        assert!(matches!(refresh, ProfileOutcome::PlayerInfoFetched(Err(_))));
    }

    #[tokio::test]
    async fn when_ammo_is_consumed_then_magazine_refills() {
        let service = ScriptedService::default().with_consume(Ok(40));
        let mut f = fixture(service);
        for _ in 0..5 {
            f.session.fire(Vec3::X);
        }

        f.client.consume_item(ItemKind::Ammo, 5);
        let outcome = f.next_outcome().await;
        f.apply(outcome);

        assert_eq!(f.session.local_avatar().map(|a| a.state().ammo), Some(30));
        assert_eq!(f.cache.ammo_reserve(), Some(40));
    }

    #[tokio::test]
    async fn when_inventory_is_missing_then_values_stay_absent() {
        let mut f = fixture(ScriptedService::default());

        f.apply(ProfileOutcome::PlayerInfoFetched(Ok(PlayerInfo::default())));

        assert_eq!(f.cache, ProfileCache::default());
        assert!(f.sink.medkits.is_empty());
        assert!(f.sink.coins.is_empty());
    }

    #[tokio::test]
    async fn statistics_are_forwarded_to_the_service() {
        let mut f = fixture(ScriptedService::default());

        f.client.submit_statistics(f.session.statistics());
        let outcome = f.next_outcome().await;
        f.apply(outcome);

        let submitted = f.service.submitted_statistics();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].get("Kills"), Some(&0));
        assert_eq!(submitted[0].get("Time"), Some(&0));
    }
}
