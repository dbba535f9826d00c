use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::asset::AssetClass;
use crate::models::price::PricePoint;
use super::traits::PriceProvider;

const PROVIDER: &str = "Yahoo Finance";

/// Intraday windows tried, in order, when looking for the latest price.
/// A single day can be empty right after a market holiday or weekend.
const SPOT_RANGES: [&str; 2] = ["1d", "5d"];
const SPOT_INTERVAL: &str = "15m";

/// Yahoo Finance API provider for equities and crypto pairs.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global equities, ETFs, indices, and `XXX-USD` crypto pairs.
/// - **Data**: Intraday quotes + full daily history.
///
/// Uses the `yahoo_finance_api` crate which wraps Yahoo Finance's
/// public endpoints. Prices are returned in the ticker's quote currency.
///
/// **Note**: Not WASM-compatible (uses native reqwest/tokio).
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        Ok(Self { connector })
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let invalid = |e: String| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Invalid date {date}: {e}"),
        };
        let month = time::Month::try_from(date.month() as u8).map_err(|e| invalid(e.to_string()))?;
        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| invalid(e.to_string()))?
            .midnight()
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }

    /// Last 15-minute close within `range`.
    async fn latest_close_in(&self, ticker: &str, range: &str) -> Result<f64, String> {
        let resp = self
            .connector
            .get_quote_range(ticker, SPOT_INTERVAL, range)
            .await
            .map_err(|e| e.to_string())?;
        let quote = resp.last_quote().map_err(|e| e.to_string())?;
        Ok(quote.close)
    }
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Equity, AssetClass::Crypto]
    }

    /// Latest 15-minute close, today first, then the last five days.
    ///
    /// Yahoo's quote-summary `currentPrice` is not consulted; the intraday
    /// chart covers every ticker this provider serves.
    async fn get_current_price(&self, ticker: &str) -> Result<f64, CoreError> {
        let mut reason = String::from("no intraday quotes");
        for range in SPOT_RANGES {
            match self.latest_close_in(ticker, range).await {
                Ok(price) => {
                    debug!(ticker, range, price, "Yahoo Finance spot price");
                    return Ok(price);
                }
                Err(e) => {
                    warn!(ticker, range, "Retrieving {range} intraday quotes failed: {e}");
                    reason = e;
                }
            }
        }
        Err(CoreError::PriceUnavailable {
            ticker: ticker.to_string(),
            reason,
        })
    }

    async fn get_price_range(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let start = Self::to_offset_datetime(from)?;
        let end = Self::to_offset_datetime(to + chrono::Duration::days(1))?; // inclusive end

        // Transport and decoding failures are upstream errors; only an
        // empty window is reported as missing history.
        let upstream = |message: String| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("{ticker} history {from}..{to}: {message}"),
        };

        let resp = self
            .connector
            .get_quote_history(ticker, start, end)
            .await
            .map_err(|e| upstream(e.to_string()))?;

        let quotes = resp.quotes().map_err(|e| upstream(e.to_string()))?;

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp)?;
                (date >= from && date <= to).then_some(PricePoint {
                    date,
                    price: q.close,
                })
            })
            .collect();

        if points.is_empty() {
            return Err(CoreError::HistoryUnavailable {
                ticker: ticker.to_string(),
                reason: format!("no closes between {from} and {to}"),
            });
        }
        Ok(points)
    }
}
