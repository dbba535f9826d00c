// ═══════════════════════════════════════════════════════════════════
// Service Tests — Request boundary, response shape, error statuses
// ═══════════════════════════════════════════════════════════════════

mod common;

use async_trait::async_trait;
use std::collections::HashMap;

use common::{d, daily_closes, Calls, FailingProvider, ScriptedProvider, TestClock};

use dca_backtest_core::errors::CoreError;
use dca_backtest_core::models::asset::AssetClass;
use dca_backtest_core::models::frequency::Frequency;
use dca_backtest_core::models::price::PriceSeries;
use dca_backtest_core::models::request::DcaRequest;
use dca_backtest_core::models::response::SavingsReport;
use dca_backtest_core::models::savings::Savings;
use dca_backtest_core::models::settings::Settings;
use dca_backtest_core::providers::registry::PriceProviderRegistry;
use dca_backtest_core::services::dca_service::DcaService;
use dca_backtest_core::services::price_service::{PriceService, PriceSource};
use dca_backtest_core::DcaCalculator;

const CLOSES: usize = 2600;

fn request(mode: &str, amount: i64, frequency: &str, years: i64, ticker: &str) -> DcaRequest {
    DcaRequest {
        mode: mode.into(),
        amount,
        frequency: frequency.into(),
        years,
        ticker: ticker.into(),
    }
}

/// BTC flat at 20 000 (spot 40 000), AAPL flat at 128 (spot 256): every
/// strategy doubles, and the AAPL arithmetic is exact in binary.
fn market() -> ScriptedProvider {
    let last = d(2024, 6, 10);
    ScriptedProvider::all_classes("Mock")
        .with_spot("BTC-USD", 40_000.0)
        .with_closes("BTC-USD", daily_closes(last, CLOSES, |_| 20_000.0))
        .with_spot("AAPL", 256.0)
        .with_closes("AAPL", daily_closes(last, CLOSES, |_| 128.0))
        .with_spot("NEWCO", 10.0)
        .with_closes("NEWCO", daily_closes(last, 100, |_| 10.0))
}

fn calculator_with(registry: PriceProviderRegistry, settings: Settings) -> DcaCalculator {
    let clock = TestClock::at(2024, 6, 10, 15, 30);
    let prices = PriceService::with_clock(registry, settings.clone(), clock.clock());
    DcaCalculator::with_price_service(prices, settings)
}

fn calculator() -> (DcaCalculator, Calls) {
    let provider = market();
    let calls = provider.calls.clone();
    let mut registry = PriceProviderRegistry::new();
    registry.register(Box::new(provider));
    (calculator_with(registry, Settings::default()), calls)
}

fn single(report: &SavingsReport) -> &Savings {
    match report {
        SavingsReport::Single(s) => s,
        SavingsReport::Table(_) => panic!("expected a single result"),
    }
}

fn table(report: &SavingsReport) -> &[Savings] {
    match report {
        SavingsReport::Table(rows) => rows,
        SavingsReport::Single(_) => panic!("expected a table"),
    }
}

// ═══════════════════════════════════════════════════════════════════
// Simple mode
// ═══════════════════════════════════════════════════════════════════

mod simple_mode {
    use super::*;

    #[tokio::test]
    async fn reports_benchmark_and_ticker() {
        let (calc, _) = calculator();
        let response = calc
            .calculate(&request("simple", 100, "w", 1, "AAPL"))
            .await
            .unwrap();

        let btc = single(&response.bitcoin);
        assert_eq!(btc.ticker, "BTC-USD");
        assert_eq!(btc.invested, 5200);
        assert_eq!(btc.savings, 10400);
        assert!((btc.profit - 100.0).abs() < 1e-9);
        assert!((btc.btc_amount.unwrap() - 0.26).abs() < 1e-12);
        assert_eq!(btc.past_years, 1);

        let stock = single(&response.stocks);
        assert_eq!(stock.ticker, "AAPL");
        assert_eq!(stock.invested, 5200);
        assert_eq!(stock.savings, 10400);
        assert_eq!(stock.profit, 100.0);
        assert_eq!(stock.btc_amount, None);
        assert_eq!(stock.units, 40.625);
    }

    #[tokio::test]
    async fn ticker_is_uppercased() {
        let (calc, _) = calculator();
        let response = calc
            .calculate(&request("simple", 100, "w", 1, " aapl "))
            .await
            .unwrap();
        assert_eq!(single(&response.stocks).ticker, "AAPL");
    }

    #[tokio::test]
    async fn equity_daily_uses_364_closes() {
        let (calc, _) = calculator();
        let response = calc
            .calculate(&request("simple", 100, "d", 1, "AAPL"))
            .await
            .unwrap();
        let stock = single(&response.stocks);
        assert_eq!(stock.invested, 36_400);
        assert_eq!(stock.savings, 72_800);
    }

    #[tokio::test]
    async fn crypto_ticker_as_request_ticker_gets_btc_amount_twice() {
        let (calc, _) = calculator();
        let response = calc
            .calculate(&request("simple", 100, "w", 1, "btc-usd"))
            .await
            .unwrap();
        assert!(single(&response.bitcoin).btc_amount.is_some());
        assert!(single(&response.stocks).btc_amount.is_some());
        assert_eq!(response.bitcoin, response.stocks);
    }

    #[tokio::test]
    async fn prices_are_cached_between_requests() {
        let (calc, calls) = calculator();
        let req = request("simple", 100, "w", 1, "AAPL");

        calc.calculate(&req).await.unwrap();
        calc.calculate(&req).await.unwrap();

        assert_eq!(calls.spot(), 2);
        assert_eq!(calls.history(), 2);
        let stats = calc.cache_stats("AAPL").await.unwrap();
        assert_eq!(stats.spot_updates, 1);
        assert_eq!(stats.history_len, CLOSES);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Table mode
// ═══════════════════════════════════════════════════════════════════

mod table_mode {
    use super::*;

    #[tokio::test]
    async fn one_row_per_year() {
        let (calc, _) = calculator();
        let response = calc
            .calculate(&request("table", 100, "w", 3, "AAPL"))
            .await
            .unwrap();

        for report in [&response.bitcoin, &response.stocks] {
            let rows = table(report);
            assert_eq!(rows.len(), 3);
            let years: Vec<u32> = rows.iter().map(|r| r.past_years).collect();
            assert_eq!(years, vec![1, 2, 3]);
            let invested: Vec<u64> = rows.iter().map(|r| r.invested).collect();
            assert_eq!(invested, vec![5200, 10_400, 15_600]);
        }

        let savings: Vec<u64> = table(&response.stocks).iter().map(|r| r.savings).collect();
        assert_eq!(savings, vec![10_400, 20_800, 31_200]);
    }

    #[tokio::test]
    async fn mode_is_case_insensitive() {
        let (calc, _) = calculator();
        let response = calc
            .calculate(&request("TABLE", 100, "m", 2, "AAPL"))
            .await
            .unwrap();
        assert_eq!(table(&response.bitcoin).len(), 2);
    }

    #[tokio::test]
    async fn short_history_fails_table() {
        let (calc, _) = calculator();
        // A year of monthly equity purchases walks back 21 × 12 = 252 closes.
        let err = calc
            .calculate(&request("table", 100, "m", 1, "NEWCO"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientHistory {
                required: 252,
                available: 100,
                ..
            }
        ));
    }

    #[test]
    fn simulate_table_rows_grow_with_years() {
        let service = DcaService::default();
        let history = PriceSeries::from_points(daily_closes(d(2024, 6, 10), CLOSES, |i| {
            100.0 + (i % 17) as f64
        }));

        let rows = service
            .simulate_table(Frequency::Biweekly, 50, 4, &history, 120.0, "SPY")
            .unwrap();

        assert_eq!(rows.len(), 4);
        for (i, row) in rows.iter().enumerate() {
            let years = i as u32 + 1;
            assert_eq!(row.past_years, years);
            assert_eq!(row.invested, 50 * 26 * u64::from(years));
        }
        assert!(rows.windows(2).all(|w| w[0].units < w[1].units));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Rejected requests
// ═══════════════════════════════════════════════════════════════════

mod rejected {
    use super::*;

    #[tokio::test]
    async fn invalid_frequency_never_reaches_providers() {
        let (calc, calls) = calculator();
        let err = calc
            .calculate(&request("simple", 100, "x", 1, "AAPL"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidFrequency(_)));
        assert_eq!(err.status_code(), 400);
        assert_eq!(calls.spot(), 0);
        assert_eq!(calls.history(), 0);
    }

    #[tokio::test]
    async fn invalid_fields_are_400() {
        let (calc, calls) = calculator();
        let bad = [
            request("simple", 0, "w", 1, "AAPL"),
            request("simple", -5, "w", 1, "AAPL"),
            request("simple", 100, "w", 0, "AAPL"),
            request("simple", 100, "w", 8, "AAPL"),
            request("simple", 100, "w", 1, ""),
            request("simple", 100, "w", 1, "TOOLONGTICKER"),
            request("chart", 100, "w", 1, "AAPL"),
        ];

        for req in &bad {
            let err = calc.calculate(req).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "{req:?} gave {err}");
            assert_eq!(err.status_code(), 400);
        }
        assert_eq!(calls.spot(), 0);
    }

    #[tokio::test]
    async fn insufficient_history_is_422() {
        let (calc, _) = calculator();
        let err = calc
            .handle(&request("simple", 100, "w", 1, "NEWCO"))
            .await
            .unwrap_err();
        assert_eq!(err.status, 422);
        assert_eq!(err.kind, "insufficient_history");
        assert!(err.error.contains("NEWCO"));
    }

    #[tokio::test]
    async fn upstream_failure_is_502() {
        let mut registry = PriceProviderRegistry::new();
        registry.register(Box::new(FailingProvider::new(vec![
            AssetClass::Crypto,
            AssetClass::Equity,
        ])));
        let calc = calculator_with(registry, Settings::default());

        let err = calc
            .handle(&request("simple", 100, "w", 1, "AAPL"))
            .await
            .unwrap_err();
        assert_eq!(err.status, 502);
        assert_eq!(err.kind, "upstream_error");
    }

    #[tokio::test]
    async fn missing_provider_is_503() {
        let calc = calculator_with(PriceProviderRegistry::new(), Settings::default());
        let err = calc
            .handle(&request("simple", 100, "w", 1, "AAPL"))
            .await
            .unwrap_err();
        assert_eq!(err.status, 503);
        assert_eq!(err.kind, "no_provider");
    }

    #[tokio::test]
    async fn unknown_ticker_is_502() {
        let (calc, _) = calculator();
        let err = calc
            .handle(&request("simple", 100, "w", 1, "ZZZZ"))
            .await
            .unwrap_err();
        assert_eq!(err.status, 502);
        assert_eq!(err.kind, "price_unavailable");
    }
}

// ═══════════════════════════════════════════════════════════════════
// JSON responses
// ═══════════════════════════════════════════════════════════════════

mod json {
    use super::*;

    #[tokio::test]
    async fn success_body() {
        let (calc, _) = calculator();
        let (status, body) = calc
            .respond_json(&request("simple", 100, "w", 1, "AAPL"))
            .await
            .unwrap();
        assert_eq!(status, 200);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["Bitcoin"]["ticker"], "BTC-USD");
        assert_eq!(json["Bitcoin"]["savings"], 10_400);
        assert_eq!(json["Bitcoin"]["profit"], 100.0);
        assert!(json["Bitcoin"].get("btc_amount").is_some());
        assert_eq!(json["Stocks"]["ticker"], "AAPL");
        assert!(json["Stocks"].get("btc_amount").is_none());
        assert!(json["Stocks"].get("units").is_none());
    }

    #[tokio::test]
    async fn table_body_is_an_array() {
        let (calc, _) = calculator();
        let (status, body) = calc
            .respond_json(&request("table", 100, "b", 2, "AAPL"))
            .await
            .unwrap();
        assert_eq!(status, 200);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["Stocks"].as_array().unwrap().len(), 2);
        assert_eq!(json["Bitcoin"][1]["past_years"], 2);
    }

    #[tokio::test]
    async fn error_body() {
        let (calc, _) = calculator();
        let (status, body) = calc
            .respond_json(&request("simple", 100, "q", 1, "AAPL"))
            .await
            .unwrap();
        assert_eq!(status, 400);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["kind"], "invalid_frequency");
        assert!(json["error"].as_str().unwrap().contains("'q'"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Custom price sources and settings
// ═══════════════════════════════════════════════════════════════════

mod sources {
    use super::*;

    /// Fixed prices, no cache, no clock.
    struct StaticPrices(HashMap<String, (f64, PriceSeries)>);

    #[async_trait]
    impl PriceSource for StaticPrices {
        async fn current_price(&self, ticker: &str) -> Result<f64, CoreError> {
            self.0
                .get(ticker)
                .map(|(spot, _)| *spot)
                .ok_or_else(|| CoreError::PriceUnavailable {
                    ticker: ticker.into(),
                    reason: "not scripted".into(),
                })
        }

        async fn history(&self, ticker: &str) -> Result<PriceSeries, CoreError> {
            self.0
                .get(ticker)
                .map(|(_, series)| series.clone())
                .ok_or_else(|| CoreError::HistoryUnavailable {
                    ticker: ticker.into(),
                    reason: "not scripted".into(),
                })
        }
    }

    #[tokio::test]
    async fn dca_service_runs_on_any_price_source() {
        let flat = |price: f64| PriceSeries::from_points(daily_closes(d(2024, 1, 1), 400, move |_| price));
        let prices = StaticPrices(HashMap::from([
            ("BTC-USD".to_string(), (20_000.0, flat(20_000.0))),
            ("MSFT".to_string(), (64.0, flat(32.0))),
        ]));

        let response = DcaService::default()
            .calculate(&prices, &request("simple", 100, "m", 1, "msft"))
            .await
            .unwrap();

        let stock = single(&response.stocks);
        assert_eq!(stock.invested, 1200);
        assert_eq!(stock.savings, 2400);
        let btc = single(&response.bitcoin);
        assert_eq!(btc.invested, 1200);
    }

    #[tokio::test]
    async fn configured_crypto_ticker_is_the_benchmark() {
        let last = d(2024, 6, 10);
        let provider = ScriptedProvider::all_classes("Mock")
            .with_spot("ETH-USD", 4096.0)
            .with_closes("ETH-USD", daily_closes(last, 400, |_| 2048.0))
            .with_spot("AAPL", 256.0)
            .with_closes("AAPL", daily_closes(last, 400, |_| 128.0));
        let mut registry = PriceProviderRegistry::new();
        registry.register(Box::new(provider));
        let settings = Settings {
            crypto_ticker: "ETH-USD".into(),
            ..Settings::default()
        };
        let calc = calculator_with(registry, settings);

        let response = calc
            .calculate(&request("simple", 100, "w", 1, "AAPL"))
            .await
            .unwrap();
        let bench = single(&response.bitcoin);
        assert_eq!(bench.ticker, "ETH-USD");
        assert!(bench.btc_amount.is_some());
        assert_eq!(bench.savings, 10_400);
    }

    #[tokio::test]
    async fn max_years_is_configurable() {
        let provider = market();
        let mut registry = PriceProviderRegistry::new();
        registry.register(Box::new(provider));
        let settings = Settings {
            max_years: 2,
            ..Settings::default()
        };
        let calc = calculator_with(registry, settings);

        let err = calc
            .calculate(&request("simple", 100, "w", 3, "AAPL"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
