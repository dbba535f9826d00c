use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

use super::frequency::Frequency;
use super::settings::Settings;

const MAX_MODE_LEN: usize = 12;
const MAX_TICKER_LEN: usize = 8;

/// Whether to report one result per asset or one per lookback year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One `Savings` per asset for the full horizon
    Simple,
    /// One `Savings` per asset for every year 1..=years
    Table,
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("simple") {
            Ok(Mode::Simple)
        } else if s.eq_ignore_ascii_case("table") {
            Ok(Mode::Table)
        } else {
            Err(CoreError::Validation(format!(
                "mode: '{s}' is not one of simple, table"
            )))
        }
    }
}

/// Inbound request parameters, exactly as received (query string, CLI flags).
///
/// Nothing here is trusted until [`DcaRequest::validate`] succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaRequest {
    pub mode: String,
    pub amount: i64,
    pub frequency: String,
    pub years: i64,
    pub ticker: String,
}

/// Validated request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcaParams {
    pub mode: Mode,
    pub amount: u32,
    pub frequency: Frequency,
    pub years: u32,
    pub ticker: String,
}

impl DcaRequest {
    /// Check every field and convert into typed parameters.
    ///
    /// A bad frequency on an otherwise valid request is reported as
    /// `InvalidFrequency`; any other problem (alone or combined) as
    /// `Validation` listing every offending field.
    pub fn validate(&self, settings: &Settings) -> Result<DcaParams, CoreError> {
        let mut problems = Vec::new();

        let mode = if self.mode.chars().count() > MAX_MODE_LEN {
            problems.push(format!("mode: must be at most {MAX_MODE_LEN} characters"));
            None
        } else {
            match self.mode.parse::<Mode>() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    problems.push(validation_message(e));
                    None
                }
            }
        };

        let amount = match u32::try_from(self.amount) {
            Ok(a) if a >= 1 => Some(a),
            _ => {
                problems.push(format!(
                    "amount: {} is not a whole number between 1 and {}",
                    self.amount,
                    u32::MAX
                ));
                None
            }
        };

        let years = match u32::try_from(self.years) {
            Ok(y) if (1..=settings.max_years).contains(&y) => Some(y),
            _ => {
                problems.push(format!(
                    "years: {} is not between 1 and {}",
                    self.years, settings.max_years
                ));
                None
            }
        };

        let ticker = self.ticker.trim();
        if ticker.is_empty() || ticker.chars().count() > MAX_TICKER_LEN {
            problems.push(format!(
                "ticker: '{}' must be 1 to {MAX_TICKER_LEN} characters",
                self.ticker
            ));
        }

        let frequency = self.frequency.parse::<Frequency>();

        match (mode, amount, years, frequency) {
            (Some(mode), Some(amount), Some(years), Ok(frequency)) if problems.is_empty() => {
                Ok(DcaParams {
                    mode,
                    amount,
                    frequency,
                    years,
                    ticker: ticker.to_uppercase(),
                })
            }
            (_, _, _, Err(e)) if problems.is_empty() => Err(e),
            (_, _, _, frequency) => {
                if let Err(e) = frequency {
                    problems.push(format!("frequency: {e}"));
                }
                Err(CoreError::Validation(problems.join("; ")))
            }
        }
    }
}

fn validation_message(e: CoreError) -> String {
    match e {
        CoreError::Validation(msg) => msg,
        other => other.to_string(),
    }
}
