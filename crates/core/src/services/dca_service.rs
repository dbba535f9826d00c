use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::frequency::Frequency;
use crate::models::price::PriceSeries;
use crate::models::request::{DcaParams, DcaRequest, Mode};
use crate::models::response::{DcaResponse, ErrorResponse, SavingsReport};
use crate::models::savings::Savings;
use crate::models::settings::Settings;
use crate::services::price_service::PriceSource;
use crate::services::simulator::DcaSimulator;

/// Request boundary: validates a request, gathers prices, runs the
/// simulation for the crypto benchmark and the requested ticker, and shapes
/// the response.
pub struct DcaService {
    settings: Settings,
    simulator: DcaSimulator,
}

/// Inputs for one ticker's simulations, fetched once per request.
struct Market {
    ticker: String,
    price: f64,
    history: PriceSeries,
}

impl DcaService {
    pub fn new(settings: Settings) -> Self {
        let simulator = DcaSimulator::new(settings.crypto_ticker.clone());
        Self {
            settings,
            simulator,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate `request` and compute the response body.
    ///
    /// Validation runs before any price is fetched, so a malformed request
    /// never reaches the price layer.
    pub async fn calculate(
        &self,
        prices: &dyn PriceSource,
        request: &DcaRequest,
    ) -> Result<DcaResponse, CoreError> {
        let params = request.validate(&self.settings)?;
        self.calculate_params(prices, &params).await
    }

    /// Like [`DcaService::calculate`], with every failure mapped to an
    /// [`ErrorResponse`] carrying its own status.
    pub async fn handle(
        &self,
        prices: &dyn PriceSource,
        request: &DcaRequest,
    ) -> Result<DcaResponse, ErrorResponse> {
        self.calculate(prices, request).await.map_err(|e| {
            warn!(kind = e.kind(), status = e.status_code(), "DCA request failed: {e}");
            ErrorResponse::from(e)
        })
    }

    /// Compute the response body for already-validated parameters.
    pub async fn calculate_params(
        &self,
        prices: &dyn PriceSource,
        params: &DcaParams,
    ) -> Result<DcaResponse, CoreError> {
        let crypto = Self::load_market(prices, &self.settings.crypto_ticker).await?;
        let target = Self::load_market(prices, &params.ticker).await?;

        let (bitcoin, stocks) = match params.mode {
            Mode::Simple => (
                SavingsReport::Single(self.simulate(&crypto, params, params.years)?),
                SavingsReport::Single(self.simulate(&target, params, params.years)?),
            ),
            Mode::Table => (
                SavingsReport::Table(self.table(&crypto, params)?),
                SavingsReport::Table(self.table(&target, params)?),
            ),
        };

        info!(
            ticker = %params.ticker,
            mode = ?params.mode,
            frequency = %params.frequency,
            amount = params.amount,
            years = params.years,
            "DCA request served"
        );
        Ok(DcaResponse { bitcoin, stocks })
    }

    /// One simulation per year `1..=years` against the same series.
    pub fn simulate_table(
        &self,
        frequency: Frequency,
        amount: u32,
        years: u32,
        history: &PriceSeries,
        current_price: f64,
        ticker: &str,
    ) -> Result<Vec<Savings>, CoreError> {
        (1..=years)
            .map(|year| {
                self.simulator
                    .simulate(frequency, amount, year, history, current_price, ticker)
            })
            .collect()
    }

    async fn load_market(prices: &dyn PriceSource, ticker: &str) -> Result<Market, CoreError> {
        let price = prices.current_price(ticker).await?;
        let history = prices.history(ticker).await?;
        Ok(Market {
            ticker: ticker.to_string(),
            price,
            history,
        })
    }

    fn simulate(&self, market: &Market, params: &DcaParams, years: u32) -> Result<Savings, CoreError> {
        self.simulator.simulate(
            params.frequency,
            params.amount,
            years,
            &market.history,
            market.price,
            &market.ticker,
        )
    }

    fn table(&self, market: &Market, params: &DcaParams) -> Result<Vec<Savings>, CoreError> {
        self.simulate_table(
            params.frequency,
            params.amount,
            params.years,
            &market.history,
            market.price,
            &market.ticker,
        )
    }
}

impl Default for DcaService {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
