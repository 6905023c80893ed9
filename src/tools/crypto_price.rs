//! Real-time coin price lookup against the Coinlore tickers listing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::Tool;
use crate::config::Config;

/// One entry of the tickers listing. Other upstream fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoinRecord {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub nameid: String,
    /// Kept exactly as the API sent it.
    #[serde(deserialize_with = "string_or_number")]
    pub price_usd: String,
}

/// Outcome of a lookup. Serializes to the tool output the model sees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PriceLookup {
    Found {
        name: String,
        symbol: String,
        price_usd: String,
    },
    NotFound {
        error: String,
    },
}

impl PriceLookup {
    pub fn not_found(query: &str) -> Self {
        PriceLookup::NotFound {
            error: format!("Coin '{}' not found.", query),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PriceLookup::Found { .. })
    }
}

impl From<&CoinRecord> for PriceLookup {
    fn from(coin: &CoinRecord) -> Self {
        PriceLookup::Found {
            name: coin.name.clone(),
            symbol: coin.symbol.clone(),
            price_usd: coin.price_usd.clone(),
        }
    }
}

/// Return the first coin whose name, symbol or nameid equals `query`,
/// ignoring case. List order decides ties.
pub fn find_coin(coins: &[CoinRecord], query: &str) -> PriceLookup {
    let needle = query.to_lowercase();
    coins
        .iter()
        .find(|coin| {
            coin.name.to_lowercase() == needle
                || coin.symbol.to_lowercase() == needle
                || coin.nameid.to_lowercase() == needle
        })
        .map(PriceLookup::from)
        .unwrap_or_else(|| PriceLookup::not_found(query))
}

/// Failures talking to the price API. Not-found is not one of these.
#[derive(Debug, Error)]
pub enum PriceApiError {
    #[error("price API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("price API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("price API returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Coinlore wraps the list in `{"data": [...], "info": {...}}`; a bare array
/// is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum TickersPayload {
    Envelope { data: Vec<CoinRecord> },
    Bare(Vec<CoinRecord>),
}

impl TickersPayload {
    fn into_coins(self) -> Vec<CoinRecord> {
        match self {
            TickersPayload::Envelope { data } => data,
            TickersPayload::Bare(coins) => coins,
        }
    }
}

/// Client for the tickers endpoint.
#[derive(Clone)]
pub struct CoinloreClient {
    client: Client,
    tickers_url: String,
}

impl CoinloreClient {
    pub fn new(client: Client, tickers_url: impl Into<String>) -> Self {
        Self {
            client,
            tickers_url: tickers_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(config.http_client()?, config.tickers_url.clone()))
    }

    /// Fetch the full listing in one request. No pagination.
    pub async fn fetch_tickers(&self) -> Result<Vec<CoinRecord>, PriceApiError> {
        let response = self.client.get(&self.tickers_url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PriceApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TickersPayload = serde_json::from_str(&body)?;
        Ok(payload.into_coins())
    }

    /// Fetch the listing and pick the coin matching `query`.
    pub async fn lookup(&self, query: &str) -> Result<PriceLookup, PriceApiError> {
        let coins = self.fetch_tickers().await?;
        let result = find_coin(&coins, query);
        tracing::debug!(
            "Looked up {:?} among {} coins: found={}",
            query,
            coins.len(),
            result.is_found()
        );
        Ok(result)
    }
}

/// The `get_crypto_price` tool handed to the model.
pub struct GetCryptoPrice {
    coinlore: CoinloreClient,
}

impl GetCryptoPrice {
    pub fn new(coinlore: CoinloreClient) -> Self {
        Self { coinlore }
    }
}

#[async_trait]
impl Tool for GetCryptoPrice {
    fn name(&self) -> &str {
        "get_crypto_price"
    }

    fn description(&self) -> &str {
        "Get real-time price of a cryptocurrency."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Coin name, ticker symbol or identifier (e.g. Bitcoin, BTC, bitcoin)"
                }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let name = args["name"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'name' argument"))?;

        let result = self.coinlore.lookup(name).await?;
        Ok(serde_json::to_string(&result)?)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for price_usd, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BITCOIN_ONLY: &str =
        r#"[{"name":"Bitcoin","symbol":"BTC","nameid":"bitcoin","price_usd":"65000.0"}]"#;

    fn coin(name: &str, symbol: &str, nameid: &str, price: &str) -> CoinRecord {
        CoinRecord {
            name: name.to_string(),
            symbol: symbol.to_string(),
            nameid: nameid.to_string(),
            price_usd: price.to_string(),
        }
    }

    fn listing() -> Vec<CoinRecord> {
        vec![
            coin("Bitcoin", "BTC", "bitcoin", "65000.0"),
            coin("Ethereum", "ETH", "ethereum", "3120.55"),
            coin("Bitcoin Cash", "BCH", "bitcoin-cash", "480.12"),
        ]
    }

    /// Serve `body` at `/api/tickers/` and count hits.
    async fn mock_coinlore(status: StatusCode, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/api/tickers/",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (status, body)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}/api/tickers/", addr), hits)
    }

    #[test]
    fn test_match_by_each_field_any_case() {
        let coins = listing();
        for query in ["BTC", "btc", "Bitcoin", "bitcoin", "BITCOIN"] {
            match find_coin(&coins, query) {
                PriceLookup::Found { name, price_usd, .. } => {
                    assert_eq!(name, "Bitcoin");
                    assert_eq!(price_usd, "65000.0");
                }
                other => panic!("{} should match, got {:?}", query, other),
            }
        }
        assert_eq!(
            find_coin(&coins, "Bitcoin-Cash"),
            PriceLookup::Found {
                name: "Bitcoin Cash".to_string(),
                symbol: "BCH".to_string(),
                price_usd: "480.12".to_string(),
            }
        );
    }

    #[test]
    fn test_first_match_wins() {
        let coins = vec![
            coin("Alpha", "DUP", "alpha", "1.0"),
            coin("Beta", "DUP", "beta", "2.0"),
        ];
        match find_coin(&coins, "dup") {
            PriceLookup::Found { name, .. } => assert_eq!(name, "Alpha"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_partial_matches() {
        assert!(!find_coin(&listing(), "bit").is_found());
        assert!(!find_coin(&listing(), " btc").is_found());
        assert!(!find_coin(&[], "btc").is_found());
    }

    #[test]
    fn test_not_found_payload() {
        let result = find_coin(&listing(), "notacoin123");
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"error":"Coin 'notacoin123' not found."}"#
        );
    }

    #[test]
    fn test_found_payload_shape() {
        let result = find_coin(&listing(), "eth");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"name": "Ethereum", "symbol": "ETH", "price_usd": "3120.55"})
        );
    }

    #[test]
    fn test_decode_envelope_and_extra_fields() {
        let body = r#"{
            "data": [{
                "id": "90", "symbol": "BTC", "name": "Bitcoin", "nameid": "bitcoin",
                "rank": 1, "price_usd": "64991.23", "percent_change_24h": "0.52"
            }],
            "info": { "coins_num": 1, "time": 1718000000 }
        }"#;
        let coins = serde_json::from_str::<TickersPayload>(body).unwrap().into_coins();
        assert_eq!(coins, vec![coin("Bitcoin", "BTC", "bitcoin", "64991.23")]);
    }

    #[test]
    fn test_decode_numeric_price() {
        let body = r#"[{"name":"Tether","symbol":"USDT","nameid":"tether","price_usd":1.0001}]"#;
        let coins = serde_json::from_str::<TickersPayload>(body).unwrap().into_coins();
        assert_eq!(coins[0].price_usd, "1.0001");
    }

    #[tokio::test]
    async fn test_lookup_btc_end_to_end() {
        let (url, hits) = mock_coinlore(StatusCode::OK, BITCOIN_ONLY).await;
        let client = CoinloreClient::new(Client::new(), url);

        let result = client.lookup("btc").await.unwrap();
        assert_eq!(
            result,
            PriceLookup::Found {
                name: "Bitcoin".to_string(),
                symbol: "BTC".to_string(),
                price_usd: "65000.0".to_string(),
            }
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_dogecoin_not_found() {
        let (url, _) = mock_coinlore(StatusCode::OK, BITCOIN_ONLY).await;
        let client = CoinloreClient::new(Client::new(), url);

        let result = client.lookup("dogecoin").await.unwrap();
        assert_eq!(result, PriceLookup::not_found("dogecoin"));
    }

    #[tokio::test]
    async fn test_every_lookup_fetches_fresh() {
        let (url, hits) = mock_coinlore(StatusCode::OK, BITCOIN_ONLY).await;
        let client = CoinloreClient::new(Client::new(), url);

        client.lookup("btc").await.unwrap();
        client.lookup("btc").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_http_error_propagates() {
        let (url, _) = mock_coinlore(StatusCode::SERVICE_UNAVAILABLE, "down").await;
        let client = CoinloreClient::new(Client::new(), url);

        match client.lookup("btc").await {
            Err(PriceApiError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_propagates() {
        let (url, _) = mock_coinlore(StatusCode::OK, "<html>oops</html>").await;
        let client = CoinloreClient::new(Client::new(), url);
        assert!(matches!(client.lookup("btc").await, Err(PriceApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_tool_execute() {
        let (url, _) = mock_coinlore(StatusCode::OK, BITCOIN_ONLY).await;
        let tool = GetCryptoPrice::new(CoinloreClient::new(Client::new(), url));

        let out = tool.execute(json!({"name": "BTC"})).await.unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["price_usd"], "65000.0");

        let out = tool.execute(json!({"name": "notacoin123"})).await.unwrap();
        assert_eq!(out, r#"{"error":"Coin 'notacoin123' not found."}"#);

        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Missing 'name'"));
    }
}
