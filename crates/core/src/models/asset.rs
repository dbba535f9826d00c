use serde::{Deserialize, Serialize};

/// Yahoo Finance symbol for bitcoin quoted in USD.
/// The one ticker simulated on the crypto calendar.
pub const BTC_TICKER: &str = "BTC-USD";

/// The market calendar an asset trades on.
/// Determines the purchase cadence and which price providers apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Trades every calendar day (BTC-USD)
    Crypto,
    /// Trades on exchange days only (AAPL, SPY, ...)
    Equity,
}

impl AssetClass {
    /// Classify `ticker` against the configured crypto ticker (case-insensitive).
    pub fn of(ticker: &str, crypto_ticker: &str) -> Self {
        if ticker.eq_ignore_ascii_case(crypto_ticker) {
            AssetClass::Crypto
        } else {
            AssetClass::Equity
        }
    }

    pub fn is_crypto(self) -> bool {
        self == AssetClass::Crypto
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Crypto => write!(f, "Crypto"),
            AssetClass::Equity => write!(f, "Equity"),
        }
    }
}

/// A ticker paired with its asset class.
///
/// **Equality and hashing** use the uppercased ticker and the class,
/// so "btc-usd" and "BTC-USD" address the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker symbol, uppercased (e.g., "BTC-USD", "AAPL")
    pub ticker: String,

    /// Market calendar — selects cadence and provider
    pub class: AssetClass,
}

impl Asset {
    /// Build an asset, classifying the ticker against `crypto_ticker`.
    pub fn classify(ticker: impl Into<String>, crypto_ticker: &str) -> Self {
        let ticker = ticker.into().to_uppercase();
        let class = AssetClass::of(&ticker, crypto_ticker);
        Self { ticker, class }
    }

    pub fn crypto(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            class: AssetClass::Crypto,
        }
    }

    pub fn equity(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            class: AssetClass::Equity,
        }
    }
}
