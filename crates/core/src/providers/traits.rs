use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::asset::AssetClass;
use crate::models::price::PricePoint;

/// Trait abstraction for market-data sources.
///
/// Each upstream API (Yahoo Finance, CoinCap) implements this trait. The
/// caching layer and the simulation depend only on this contract, so a
/// source can be swapped without touching either.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which asset classes this provider can quote.
    fn supported_asset_classes(&self) -> Vec<AssetClass>;

    /// Latest known price of `ticker` in USD.
    ///
    /// Fails with `PriceUnavailable` when no price can be determined.
    async fn get_current_price(&self, ticker: &str) -> Result<f64, CoreError>;

    /// Daily closes of `ticker` for `from..=to`, oldest first.
    ///
    /// Fails with `HistoryUnavailable` when the window holds no closes.
    async fn get_price_range(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}
