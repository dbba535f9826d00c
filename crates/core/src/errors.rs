use thiserror::Error;

/// Unified error type for the entire dca-backtest-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Request ─────────────────────────────────────────────────────
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid frequency '{0}' — expected one of d, w, b, m")]
    InvalidFrequency(String),

    // ── Simulation ──────────────────────────────────────────────────
    #[error("Price history for {ticker} ticker doesn't go far back enough ({available} of {required} trading days)")]
    InsufficientHistory {
        ticker: String,
        required: usize,
        available: usize,
    },

    #[error("Simulation failed: {0}")]
    Domain(String),

    // ── Market data ─────────────────────────────────────────────────
    #[error("Unable to extract price for {ticker} ticker: {reason}")]
    PriceUnavailable { ticker: String, reason: String },

    #[error("Unable to extract price history for {ticker} ticker: {reason}")]
    HistoryUnavailable { ticker: String, reason: String },

    #[error("API error ({provider}): {message}")]
    Api { provider: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No provider available for asset class: {0}")]
    NoProvider(String),

    // ── Output ──────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    /// Response status the request boundary reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Validation(_) | CoreError::InvalidFrequency(_) => 400,
            CoreError::InsufficientHistory { .. } => 422,
            CoreError::Domain(_) | CoreError::Serialization(_) => 500,
            CoreError::PriceUnavailable { .. }
            | CoreError::HistoryUnavailable { .. }
            | CoreError::Api { .. } => 502,
            CoreError::Network(_) | CoreError::NoProvider(_) => 503,
        }
    }

    /// Stable machine-readable name for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "invalid_request",
            CoreError::InvalidFrequency(_) => "invalid_frequency",
            CoreError::InsufficientHistory { .. } => "insufficient_history",
            CoreError::Domain(_) => "domain_error",
            CoreError::PriceUnavailable { .. } => "price_unavailable",
            CoreError::HistoryUnavailable { .. } => "history_unavailable",
            CoreError::Api { .. } => "upstream_error",
            CoreError::Network(_) => "network_error",
            CoreError::NoProvider(_) => "no_provider",
            CoreError::Serialization(_) => "serialization_error",
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors embed the full URL; drop the query string.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
