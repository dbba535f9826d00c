use tracing::debug;

use crate::errors::CoreError;
use crate::models::asset::{AssetClass, BTC_TICKER};
use crate::models::frequency::Frequency;
use crate::models::price::PriceSeries;
use crate::models::savings::Savings;
use crate::services::cadence::CadencePolicy;

/// Replays a dollar-cost-averaging strategy over historical closes.
///
/// Holds only the crypto ticker it classifies against; every call to
/// [`DcaSimulator::simulate`] is independent and side-effect free, so one
/// simulator can be shared across threads and called once per table row.
#[derive(Debug, Clone)]
pub struct DcaSimulator {
    crypto_ticker: String,
}

impl DcaSimulator {
    pub fn new(crypto_ticker: impl Into<String>) -> Self {
        Self {
            crypto_ticker: crypto_ticker.into(),
        }
    }

    pub fn crypto_ticker(&self) -> &str {
        &self.crypto_ticker
    }

    /// Simulate buying `amount` of `ticker` every `frequency` for `years`,
    /// valuing the position at `current_price`.
    ///
    /// Purchases walk backward from the newest close: the first buy is
    /// `step` trading days before the end of `history`, each following buy
    /// another `step` further back, `iterations` buys in total.
    ///
    /// Errors:
    /// - `InsufficientHistory` when `history` is shorter than `step × iterations`.
    /// - `Domain` when a close of zero (or any non-finite result) is hit.
    pub fn simulate(
        &self,
        frequency: Frequency,
        amount: u32,
        years: u32,
        history: &PriceSeries,
        current_price: f64,
        ticker: &str,
    ) -> Result<Savings, CoreError> {
        let class = AssetClass::of(ticker, &self.crypto_ticker);
        let cadence = CadencePolicy::parameters(class, frequency, years);

        if cadence.required_history() > history.len() {
            return Err(CoreError::InsufficientHistory {
                ticker: ticker.to_string(),
                required: cadence.required_history(),
                available: history.len(),
            });
        }

        let amount_f = f64::from(amount);
        let mut units = 0.0;
        let mut pointer = cadence.step;
        for _ in 0..cadence.iterations {
            let price = history.price_back(pointer).ok_or_else(|| {
                CoreError::Domain(format!("no close {pointer} trading days back for {ticker}"))
            })?;
            let bought = amount_f / price;
            if !bought.is_finite() {
                return Err(CoreError::Domain(format!(
                    "cannot buy {ticker} at a close of {price}"
                )));
            }
            units += bought;
            pointer += cadence.step;
        }

        let total_value = units * current_price;
        let invested = u64::from(amount) * cadence.iterations as u64;
        let profit = (total_value / invested as f64 - 1.0) * 100.0;
        if !total_value.is_finite() || !profit.is_finite() {
            return Err(CoreError::Domain(format!(
                "position value for {ticker} is not a finite number"
            )));
        }

        debug!(
            ticker,
            %frequency,
            years,
            step = cadence.step,
            iterations = cadence.iterations,
            units,
            "simulated DCA"
        );

        Ok(Savings {
            ticker: ticker.to_string(),
            invested,
            // Truncation, not rounding: a position worth 99.9 reports 99.
            savings: total_value as u64,
            profit,
            btc_amount: class.is_crypto().then_some(units),
            past_years: years,
            units,
        })
    }
}

impl Default for DcaSimulator {
    fn default() -> Self {
        Self::new(BTC_TICKER)
    }
}
