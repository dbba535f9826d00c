use serde::{Deserialize, Serialize};

use super::asset::BTC_TICKER;

/// Runtime configuration for the calculator and its price cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ticker simulated on the crypto calendar and reported under "Bitcoin".
    pub crypto_ticker: String,

    /// A cached spot price older than this is refetched.
    pub spot_refresh_interval_secs: u64,

    /// Depth of the first-run history backfill.
    pub backfill_years: u32,

    /// Largest lookback a request may ask for.
    pub max_years: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            crypto_ticker: BTC_TICKER.to_string(),
            spot_refresh_interval_secs: 15 * 60,
            backfill_years: 10,
            max_years: 7,
        }
    }
}
