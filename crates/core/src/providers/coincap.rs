use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::asset::AssetClass;
use crate::models::price::PricePoint;
use super::traits::PriceProvider;

const BASE_URL: &str = "https://api.coincap.io/v2";
const PROVIDER: &str = "CoinCap";

/// CoinCap API provider for cryptocurrency prices (USD).
///
/// - **Free**: No API key required.
/// - **Endpoints**: `/assets/{id}`, `/assets/{id}/history`, `/assets?search={symbol}`
///
/// CoinCap addresses assets by lowercase ids ("bitcoin"). Tickers are
/// accepted in either plain ("BTC") or Yahoo pair form ("BTC-USD"); the
/// quote suffix is stripped before the id lookup.
pub struct CoinCapProvider {
    client: Client,
    /// Map from uppercase symbol (BTC) to CoinCap asset id (bitcoin).
    /// Seeded with common mappings, extended at runtime via search.
    symbol_map: Mutex<HashMap<String, String>>,
}

impl CoinCapProvider {
    pub fn new() -> Self {
        let symbol_map = [
            ("BTC", "bitcoin"),
            ("ETH", "ethereum"),
            ("SOL", "solana"),
            ("LTC", "litecoin"),
            ("DOGE", "dogecoin"),
        ]
        .into_iter()
        .map(|(sym, id)| (sym.to_string(), id.to_string()))
        .collect();

        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            symbol_map: Mutex::new(symbol_map),
        }
    }

    /// "btc-usd" → "BTC", "eth" → "ETH".
    pub fn base_symbol(ticker: &str) -> String {
        let upper = ticker.to_uppercase();
        match upper.strip_suffix("-USD") {
            Some(base) => base.to_string(),
            None => upper,
        }
    }

    /// Resolve a ticker like "BTC-USD" to a CoinCap id like "bitcoin".
    /// Checks the static map only; unknown symbols fall back to lowercase.
    pub fn resolve_id(&self, ticker: &str) -> String {
        let symbol = Self::base_symbol(ticker);
        let map = self.symbol_map.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&symbol)
            .cloned()
            .unwrap_or_else(|| symbol.to_lowercase())
    }

    /// Resolve a ticker by searching the CoinCap API when it is not mapped yet.
    /// Caches the result for future lookups.
    async fn resolve_id_dynamic(&self, ticker: &str) -> Result<String, CoreError> {
        let symbol = Self::base_symbol(ticker);

        {
            let map = self.symbol_map.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(id) = map.get(&symbol) {
                return Ok(id.clone());
            }
        }

        let url = format!("{BASE_URL}/assets?search={symbol}&limit=5");
        let resp: AssetsSearchResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to search for {symbol}: {e}"),
            })?;

        let id = resp
            .data
            .into_iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(&symbol))
            .map(|a| a.id)
            .ok_or_else(|| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("No CoinCap asset found for symbol {symbol}"),
            })?;

        debug!(%symbol, %id, "resolved CoinCap asset id");
        self.symbol_map
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(symbol, id.clone());

        Ok(id)
    }

    fn day_bounds_millis(from: NaiveDate, to: NaiveDate) -> (i64, i64) {
        let start = from.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
        let end = to
            .succ_opt()
            .unwrap_or(to)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp_millis()
            - 1;
        (start, end)
    }
}

impl Default for CoinCapProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinCap API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct AssetResponse {
    data: AssetData,
}

#[derive(Deserialize)]
struct AssetData {
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    data: Vec<HistoryPoint>,
}

#[derive(Deserialize)]
struct HistoryPoint {
    #[serde(rename = "priceUsd")]
    price_usd: String,
    time: i64, // unix timestamp in milliseconds
}

#[derive(Deserialize)]
struct AssetsSearchResponse {
    data: Vec<AssetSearchEntry>,
}

#[derive(Deserialize)]
struct AssetSearchEntry {
    id: String,
    symbol: String,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for CoinCapProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Crypto]
    }

    async fn get_current_price(&self, ticker: &str) -> Result<f64, CoreError> {
        let id = self.resolve_id_dynamic(ticker).await?;
        let url = format!("{BASE_URL}/assets/{id}");

        let resp: AssetResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse response for {ticker}: {e}"),
            })?;

        let unavailable = |reason: String| CoreError::PriceUnavailable {
            ticker: ticker.to_string(),
            reason,
        };

        resp.data
            .price_usd
            .ok_or_else(|| unavailable("CoinCap returned no priceUsd".into()))?
            .parse::<f64>()
            .map_err(|e| unavailable(format!("invalid price format: {e}")))
    }

    async fn get_price_range(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let id = self.resolve_id_dynamic(ticker).await?;
        let (start, end) = Self::day_bounds_millis(from, to);

        let url = format!("{BASE_URL}/assets/{id}/history?interval=d1&start={start}&end={end}");

        let resp: HistoryResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse history range for {ticker}: {e}"),
            })?;

        let points: Vec<PricePoint> = resp
            .data
            .iter()
            .filter_map(|p| {
                let price: f64 = p.price_usd.parse().ok()?;
                let dt = chrono::DateTime::from_timestamp_millis(p.time)?;
                Some(PricePoint {
                    date: dt.date_naive(),
                    price,
                })
            })
            .collect();

        if points.is_empty() {
            return Err(CoreError::HistoryUnavailable {
                ticker: ticker.to_string(),
                reason: format!("CoinCap returned no closes between {from} and {to}"),
            });
        }
        Ok(points)
    }
}
