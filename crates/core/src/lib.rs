pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use models::{
    price::PriceSeries,
    request::DcaRequest,
    response::{DcaResponse, ErrorResponse},
    settings::Settings,
};
use providers::registry::PriceProviderRegistry;
use services::{
    dca_service::DcaService,
    price_service::{CacheStats, PriceService, PriceSource, RefreshOutcome},
};

use errors::CoreError;

/// Main entry point for the DCA Backtest core library.
/// Owns the price cache and the request boundary built on top of it.
#[must_use]
pub struct DcaCalculator {
    price_service: PriceService,
    dca_service: DcaService,
}

impl std::fmt::Debug for DcaCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DcaCalculator")
            .field("settings", self.dca_service.settings())
            .finish()
    }
}

impl DcaCalculator {
    /// Calculator backed by the default providers (Yahoo Finance, CoinCap).
    pub fn new(settings: Settings) -> Self {
        Self::with_registry(settings, PriceProviderRegistry::new_with_defaults())
    }

    /// Calculator backed by a caller-assembled provider registry.
    pub fn with_registry(settings: Settings, registry: PriceProviderRegistry) -> Self {
        Self::with_price_service(PriceService::new(registry, settings.clone()), settings)
    }

    /// Calculator around an existing price service (e.g. one with a fixed clock).
    pub fn with_price_service(price_service: PriceService, settings: Settings) -> Self {
        Self {
            price_service,
            dca_service: DcaService::new(settings),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.dca_service.settings()
    }

    // ── Requests ────────────────────────────────────────────────────

    /// Validate `request`, refresh prices as needed and simulate.
    pub async fn calculate(&self, request: &DcaRequest) -> Result<DcaResponse, CoreError> {
        self.dca_service.calculate(&self.price_service, request).await
    }

    /// Same as [`DcaCalculator::calculate`] with errors shaped for a response body.
    pub async fn handle(&self, request: &DcaRequest) -> Result<DcaResponse, ErrorResponse> {
        self.dca_service.handle(&self.price_service, request).await
    }

    /// Serialize the outcome of `request` as `(status, JSON body)`.
    pub async fn respond_json(&self, request: &DcaRequest) -> Result<(u16, String), CoreError> {
        match self.handle(request).await {
            Ok(response) => Ok((200, serde_json::to_string_pretty(&response)?)),
            Err(error) => Ok((error.status, serde_json::to_string_pretty(&error)?)),
        }
    }

    // ── Prices ──────────────────────────────────────────────────────

    /// Latest spot price of `ticker` (cached up to the refresh interval).
    pub async fn current_price(&self, ticker: &str) -> Result<f64, CoreError> {
        self.price_service.current_price(ticker).await
    }

    /// Cached daily history of `ticker`, refreshed at most once a day.
    pub async fn history(&self, ticker: &str) -> Result<PriceSeries, CoreError> {
        self.price_service.history(ticker).await
    }

    /// Refresh whatever is stale for `ticker`.
    pub async fn refresh_if_stale(&self, ticker: &str) -> Result<RefreshOutcome, CoreError> {
        self.price_service.refresh_if_stale(ticker).await
    }

    /// Cache bookkeeping for `ticker`.
    pub async fn cache_stats(&self, ticker: &str) -> Option<CacheStats> {
        self.price_service.stats(ticker).await
    }
}
