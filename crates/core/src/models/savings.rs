use serde::{Deserialize, Serialize, Serializer};

/// Outcome of one simulated DCA strategy for one ticker.
///
/// Built once per simulation call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Savings {
    /// Ticker the strategy bought
    pub ticker: String,

    /// Nominal currency contributed: amount × purchases
    pub invested: u64,

    /// Current value of the accumulated position, truncated to whole units of currency
    pub savings: u64,

    /// Percentage return against `invested`: (value / invested − 1) × 100.
    /// Serialized to two decimal places.
    #[serde(serialize_with = "serialize_two_decimals")]
    pub profit: f64,

    /// Accumulated coin amount, present only for the crypto ticker.
    /// Serialized to eight decimal places (one satoshi).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_eight_decimals"
    )]
    pub btc_amount: Option<f64>,

    /// Lookback horizon in years
    pub past_years: u32,

    /// Fractional units accumulated (not part of the wire format)
    #[serde(skip)]
    pub units: f64,
}

impl std::fmt::Display for Savings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ticker: {} Invested: {} Savings: {} Profit: {:.2}%",
            self.ticker, self.invested, self.savings, self.profit
        )?;
        if let Some(btc) = self.btc_amount {
            write!(f, " Btc: {btc:.8}")?;
        }
        Ok(())
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn serialize_two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 2))
}

fn serialize_eight_decimals<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&round_to(*v, 8)),
        None => serializer.serialize_none(),
    }
}
