use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::price::{PriceCache, PricePoint, PriceSeries};
use crate::models::settings::Settings;
use crate::providers::registry::PriceProviderRegistry;

/// Source of "now" for staleness checks.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What the request boundary needs from the price layer.
///
/// Implementations return a consistent, oldest-first series as of call
/// time; refresh timing is their own business.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PriceSource: Send + Sync {
    /// Latest spot price of `ticker`.
    async fn current_price(&self, ticker: &str) -> Result<f64, CoreError>;

    /// Full cached daily history of `ticker`, oldest first.
    async fn history(&self, ticker: &str) -> Result<PriceSeries, CoreError>;
}

/// Which parts of a ticker's cache a refresh touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshOutcome {
    pub spot_refreshed: bool,
    pub history: HistoryRefresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryRefresh {
    /// Already refreshed today
    #[default]
    Fresh,
    /// First run: the whole backfill window was fetched
    Backfilled { added: usize },
    /// Missing days since the last refresh were fetched
    Incremental { added: usize },
    /// The increment could not be fetched; the cached series is unchanged
    Deferred,
}

/// Operational counters for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub spot_updates: u32,
    pub history_updates: u32,
    pub history_len: usize,
    pub history_last_updated: Option<NaiveDate>,
}

/// Fetches prices from API providers and caches them in memory.
///
/// Cache strategy:
/// - **Spot price**: refetched when older than `spot_refresh_interval_secs`.
/// - **History**: first request backfills `backfill_years` of closes; later
///   requests fetch only the days since the last refresh, at most once per
///   UTC day, and merge them by date. A failed increment is not recorded as
///   a refresh and is retried on the next call.
///
/// The cache sits behind one async mutex held across the upstream call, so
/// concurrent requests for a stale ticker trigger a single fetch.
pub struct PriceService {
    registry: PriceProviderRegistry,
    settings: Settings,
    cache: Mutex<PriceCache>,
    clock: Clock,
}

impl PriceService {
    pub fn new(registry: PriceProviderRegistry, settings: Settings) -> Self {
        Self::with_clock(registry, settings, Arc::new(Utc::now))
    }

    pub fn with_clock(registry: PriceProviderRegistry, settings: Settings, clock: Clock) -> Self {
        Self {
            registry,
            settings,
            cache: Mutex::new(PriceCache::new()),
            clock,
        }
    }

    /// Check if at least one provider can quote `ticker`.
    pub fn has_provider_for(&self, ticker: &str) -> bool {
        let asset = self.asset(ticker);
        self.registry.get_provider_for(asset.class).is_some()
    }

    /// Refresh whatever is stale for `ticker`: the spot price, the history, or both.
    pub async fn refresh_if_stale(&self, ticker: &str) -> Result<RefreshOutcome, CoreError> {
        let asset = self.asset(ticker);
        let mut cache = self.cache.lock().await;
        let spot_refreshed = self.refresh_spot_locked(&mut cache, &asset).await?.1;
        let history = self.refresh_history_locked(&mut cache, &asset).await?;
        Ok(RefreshOutcome {
            spot_refreshed,
            history,
        })
    }

    /// Bookkeeping for `ticker`; `None` if it was never fetched.
    pub async fn stats(&self, ticker: &str) -> Option<CacheStats> {
        let cache = self.cache.lock().await;
        let spot = cache.get_spot(ticker);
        let history = cache.get_history(ticker);
        if spot.is_none() && history.is_none() {
            return None;
        }
        Some(CacheStats {
            spot_updates: spot.map_or(0, |s| s.update_count),
            history_updates: history.map_or(0, |h| h.update_count),
            history_len: history.map_or(0, |h| h.series.len()),
            history_last_updated: history.and_then(|h| h.last_updated),
        })
    }

    /// Drop every cached price.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    fn asset(&self, ticker: &str) -> Asset {
        Asset::classify(ticker, &self.settings.crypto_ticker)
    }

    /// Returns the spot price and whether it had to be refetched.
    async fn refresh_spot_locked(
        &self,
        cache: &mut PriceCache,
        asset: &Asset,
    ) -> Result<(f64, bool), CoreError> {
        let now = (self.clock)();
        let max_age_secs =
            i64::try_from(self.settings.spot_refresh_interval_secs).unwrap_or(i64::MAX);

        if let Some(quote) = cache.get_spot(&asset.ticker) {
            if (now - quote.fetched_at).num_seconds() <= max_age_secs {
                debug!(ticker = %asset.ticker, price = quote.price, "spot price cache hit");
                return Ok((quote.price, false));
            }
        }

        let price = self.fetch_current_price(asset).await?;
        cache.set_spot(&asset.ticker, price, now);
        info!(ticker = %asset.ticker, price, "refreshed spot price");
        Ok((price, true))
    }

    async fn refresh_history_locked(
        &self,
        cache: &mut PriceCache,
        asset: &Asset,
    ) -> Result<HistoryRefresh, CoreError> {
        let today = (self.clock)().date_naive();
        let last_updated = cache
            .get_history(&asset.ticker)
            .filter(|h| h.update_count > 0 && !h.series.is_empty())
            .and_then(|h| h.last_updated);

        match last_updated {
            Some(date) if date >= today => {
                debug!(ticker = %asset.ticker, "history cache hit");
                Ok(HistoryRefresh::Fresh)
            }
            Some(date) => {
                // The last stored day is re-fetched: its close may have been intraday.
                // A failed increment leaves the refresh stamp alone, so the
                // next call tries again; the cached series is still served.
                let points = match self.fetch_price_range(asset, date, today).await {
                    Ok(points) => points,
                    Err(e) => {
                        warn!(ticker = %asset.ticker, since = %date, "history increment failed: {e}");
                        return Ok(HistoryRefresh::Deferred);
                    }
                };
                let added = cache.merge_history(&asset.ticker, &points, today);
                info!(ticker = %asset.ticker, added, since = %date, "refreshed price history");
                Ok(HistoryRefresh::Incremental { added })
            }
            None => {
                let from = today
                    .checked_sub_months(Months::new(12 * self.settings.backfill_years))
                    .unwrap_or(NaiveDate::MIN);
                let points = self.fetch_price_range(asset, from, today).await?;
                let added = cache.merge_history(&asset.ticker, &points, today);
                info!(ticker = %asset.ticker, added, %from, "backfilled price history");
                Ok(HistoryRefresh::Backfilled { added })
            }
        }
    }

    /// Fetch a spot price from API providers with automatic fallback.
    ///
    /// Tries providers in registration order and rejects prices that are
    /// not finite and positive.
    async fn fetch_current_price(&self, asset: &Asset) -> Result<f64, CoreError> {
        let providers = self.registry.get_providers_for(asset.class);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(asset.class.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider.get_current_price(&asset.ticker).await {
                Ok(price) if price.is_finite() && price > 0.0 => return Ok(price),
                Ok(price) => {
                    warn!(provider = provider.name(), ticker = %asset.ticker, price, "rejected spot price");
                    last_error = Some(CoreError::PriceUnavailable {
                        ticker: asset.ticker.clone(),
                        reason: format!(
                            "{} returned {price} (must be finite and positive)",
                            provider.name()
                        ),
                    });
                }
                Err(e) => {
                    warn!(provider = provider.name(), ticker = %asset.ticker, "spot price fetch failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(asset.class.to_string())))
    }

    /// Fetch a window of daily closes with automatic provider fallback.
    async fn fetch_price_range(
        &self,
        asset: &Asset,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let providers = self.registry.get_providers_for(asset.class);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(asset.class.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider.get_price_range(&asset.ticker, from, to).await {
                Ok(points) => return Ok(points),
                Err(e) => {
                    warn!(provider = provider.name(), ticker = %asset.ticker, "history fetch failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(asset.class.to_string())))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceSource for PriceService {
    async fn current_price(&self, ticker: &str) -> Result<f64, CoreError> {
        let asset = self.asset(ticker);
        let mut cache = self.cache.lock().await;
        Ok(self.refresh_spot_locked(&mut cache, &asset).await?.0)
    }

    async fn history(&self, ticker: &str) -> Result<PriceSeries, CoreError> {
        let asset = self.asset(ticker);
        let mut cache = self.cache.lock().await;
        self.refresh_history_locked(&mut cache, &asset).await?;
        match cache.get_history(&asset.ticker) {
            Some(entry) if !entry.series.is_empty() => Ok(entry.series.clone()),
            _ => Err(CoreError::HistoryUnavailable {
                ticker: asset.ticker.clone(),
                reason: "no closes cached".into(),
            }),
        }
    }
}
