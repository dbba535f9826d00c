use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::savings::Savings;

/// Results for one asset: a single horizon, or one row per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavingsReport {
    Single(Savings),
    Table(Vec<Savings>),
}

impl SavingsReport {
    /// All rows in this report, in year order.
    pub fn rows(&self) -> Vec<&Savings> {
        match self {
            SavingsReport::Single(s) => vec![s],
            SavingsReport::Table(rows) => rows.iter().collect(),
        }
    }
}

/// Successful response body: the crypto benchmark next to the requested ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaResponse {
    #[serde(rename = "Bitcoin")]
    pub bitcoin: SavingsReport,

    #[serde(rename = "Stocks")]
    pub stocks: SavingsReport,
}

/// Failure response body. Every `CoreError` kind maps to its own status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub kind: String,
    pub error: String,
}

impl From<&CoreError> for ErrorResponse {
    fn from(e: &CoreError) -> Self {
        Self {
            status: e.status_code(),
            kind: e.kind().to_string(),
            error: e.to_string(),
        }
    }
}

impl From<CoreError> for ErrorResponse {
    fn from(e: CoreError) -> Self {
        Self::from(&e)
    }
}
