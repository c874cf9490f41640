use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

// Render sink consumed by the core. The core only writes to it.
pub trait RenderSink: Send {
    fn set_health(&mut self, health: i32);
    fn set_ammo(&mut self, capacity: u32, ammo: u32);
    fn set_coin_text(&mut self, text: String);
    fn set_medkit_text(&mut self, text: String);
}

/// Virtual currencies known to the persistence service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CurrencyKind {
    Coins,
}

impl CurrencyKind {
    pub fn code(self) -> &'static str {
        match self {
            CurrencyKind::Coins => "CO",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "CO" => Some(CurrencyKind::Coins),
            _ => None,
        }
    }
}

/// Consumable inventory items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Medkit,
    Ammo,
}

impl ItemKind {
    pub fn code(self) -> &'static str {
        match self {
            ItemKind::Medkit => "MK",
            ItemKind::Ammo => "AM",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "MK" => Some(ItemKind::Medkit),
            "AM" => Some(ItemKind::Ammo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyOperation {
    Add,
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyRequest {
    pub operation: CurrencyOperation,
    pub kind: CurrencyKind,
    pub amount: u32,
}

impl CurrencyRequest {
    /// Builds an add or subtract request from a signed delta.
    pub fn from_delta(kind: CurrencyKind, delta: i64) -> Self {
        let operation = if delta < 0 {
            CurrencyOperation::Subtract
        } else {
            CurrencyOperation::Add
        };
        Self {
            operation,
            kind,
            amount: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerInfoRequest {
    pub get_inventory: bool,
    pub get_currency: bool,
}

/// Server-side view of the player's inventory and balances.
///
/// Unknown item or currency codes are dropped when the adapter maps the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerInfo {
    pub inventory: Option<BTreeMap<ItemKind, u32>>,
    pub currency: Option<BTreeMap<CurrencyKind, i64>>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("persistence service unavailable")]
    Unavailable,
    #[error("malformed response")]
    Malformed,
}

// Port for the remote persistence service (currency, inventory, statistics).
#[async_trait]
pub trait PersistenceService: Send + Sync {
    async fn adjust_currency(&self, request: CurrencyRequest) -> Result<i64, PersistenceError>;
    async fn fetch_player_info(
        &self,
        request: PlayerInfoRequest,
    ) -> Result<PlayerInfo, PersistenceError>;
    /// Consumes `count` uses of `item`; returns the remaining uses.
    async fn consume_item(&self, item: ItemKind, count: u32) -> Result<u32, PersistenceError>;
    async fn submit_statistics(
        &self,
        statistics: BTreeMap<String, i64>,
    ) -> Result<(), PersistenceError>;
}
