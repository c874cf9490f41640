use crate::domain::ports::{
    CurrencyKind, CurrencyOperation, CurrencyRequest, ItemKind, PersistenceError,
    PersistenceService, PlayerInfo, PlayerInfoRequest,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct AdjustCurrencyRequest<'a> {
    operation: &'a str,
    kind: &'a str,
    amount: u32,
}

#[derive(Debug, Deserialize)]
struct AdjustCurrencyResponse {
    success: bool,
    #[serde(default)]
    new_balance: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct PlayerInfoBody {
    get_inventory: bool,
    get_currency: bool,
}

#[derive(Debug, Deserialize)]
struct PlayerInfoResponse {
    // Item id -> remaining uses.
    #[serde(default)]
    inventory: Option<HashMap<String, u32>>,
    // Currency code -> balance.
    #[serde(default)]
    currency: Option<HashMap<String, i64>>,
}

#[derive(Debug, Serialize)]
struct ConsumeItemRequest<'a> {
    item_id: &'a str,
    count: u32,
}

#[derive(Debug, Deserialize)]
struct ConsumeItemResponse {
    success: bool,
    #[serde(default)]
    remaining_uses: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatisticUpdate<'a> {
    name: &'a str,
    value: i64,
}

#[derive(Debug, Serialize)]
struct SubmitStatisticsRequest<'a> {
    statistics: Vec<StatisticUpdate<'a>>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

// Thin reqwest client for the remote persistence service.
#[derive(Clone)]
pub struct PersistenceClient {
    http: reqwest::Client,
    base_url: String,
}

impl PersistenceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, PersistenceError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|_| PersistenceError::Unavailable)?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            return Err(PersistenceError::Unavailable);
        }
        if !status.is_success() {
            return Err(PersistenceError::Rejected(format!("status {status}")));
        }

        response
            .json::<R>()
            .await
            .map_err(|_| PersistenceError::Malformed)
    }
}

fn rejected(error: Option<String>) -> PersistenceError {
    PersistenceError::Rejected(error.unwrap_or_else(|| "unspecified".to_string()))
}

#[async_trait]
impl PersistenceService for PersistenceClient {
    async fn adjust_currency(&self, request: CurrencyRequest) -> Result<i64, PersistenceError> {
        let operation = match request.operation {
            CurrencyOperation::Add => "add",
            CurrencyOperation::Subtract => "subtract",
        };
        let response: AdjustCurrencyResponse = self
            .post(
                "/currency/adjust",
                &AdjustCurrencyRequest {
                    operation,
                    kind: request.kind.code(),
                    amount: request.amount,
                },
            )
            .await?;

        if !response.success {
            return Err(rejected(response.error));
        }
        response.new_balance.ok_or(PersistenceError::Malformed)
    }

    async fn fetch_player_info(
        &self,
        request: PlayerInfoRequest,
    ) -> Result<PlayerInfo, PersistenceError> {
        let response: PlayerInfoResponse = self
            .post(
                "/player/info",
                &PlayerInfoBody {
                    get_inventory: request.get_inventory,
                    get_currency: request.get_currency,
                },
            )
            .await?;

        // Codes this client does not know about are dropped.
        let inventory = response.inventory.map(|items| {
            items
                .into_iter()
                .filter_map(|(code, uses)| ItemKind::from_code(&code).map(|item| (item, uses)))
                .collect::<BTreeMap<_, _>>()
        });
        let currency = response.currency.map(|balances| {
            balances
                .into_iter()
                .filter_map(|(code, balance)| {
                    CurrencyKind::from_code(&code).map(|kind| (kind, balance))
                })
                .collect::<BTreeMap<_, _>>()
        });

        Ok(PlayerInfo {
            inventory,
            currency,
        })
    }

    async fn consume_item(&self, item: ItemKind, count: u32) -> Result<u32, PersistenceError> {
        let response: ConsumeItemResponse = self
            .post(
                "/inventory/consume",
                &ConsumeItemRequest {
                    item_id: item.code(),
                    count,
                },
            )
            .await?;

        if !response.success {
            return Err(rejected(response.error));
        }
        response.remaining_uses.ok_or(PersistenceError::Malformed)
    }

    async fn submit_statistics(
        &self,
        statistics: BTreeMap<String, i64>,
    ) -> Result<(), PersistenceError> {
        let body = SubmitStatisticsRequest {
            statistics: statistics
                .iter()
                .map(|(name, value)| StatisticUpdate {
                    name,
                    value: *value,
                })
                .collect(),
        };
        let response: AckResponse = self.post("/statistics", &body).await?;

        if !response.success {
            return Err(rejected(response.error));
        }
        Ok(())
    }
}
