use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dca_backtest_core::models::request::DcaRequest;
use dca_backtest_core::models::settings::Settings;
use dca_backtest_core::DcaCalculator;

/// Backtest a dollar-cost-averaging strategy against BTC and a stock ticker.
#[derive(Debug, Parser)]
#[command(name = "dca", version, about)]
struct Args {
    /// Ticker to compare against the crypto benchmark (e.g. AAPL)
    #[arg(long)]
    ticker: String,

    /// Amount invested per purchase, in whole USD
    #[arg(long, allow_hyphen_values = true)]
    amount: i64,

    /// Purchase frequency: d(aily), w(eekly), b(iweekly), m(onthly)
    #[arg(long, default_value = "w")]
    frequency: String,

    /// Lookback horizon in years
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    years: i64,

    /// "simple" for one result per asset, "table" for one per year
    #[arg(long, default_value = "simple")]
    mode: String,

    /// Ticker simulated on the crypto calendar
    #[arg(long, env = "DCA_CRYPTO_TICKER")]
    crypto_ticker: Option<String>,

    /// Seconds before a cached spot price is refetched
    #[arg(long, env = "DCA_SPOT_REFRESH_SECS")]
    spot_refresh_secs: Option<u64>,

    /// Years of history fetched on first use of a ticker
    #[arg(long, env = "DCA_BACKFILL_YEARS")]
    backfill_years: Option<u32>,
}

impl Args {
    fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            crypto_ticker: self
                .crypto_ticker
                .clone()
                .unwrap_or(defaults.crypto_ticker),
            spot_refresh_interval_secs: self
                .spot_refresh_secs
                .unwrap_or(defaults.spot_refresh_interval_secs),
            backfill_years: self.backfill_years.unwrap_or(defaults.backfill_years),
            ..defaults
        }
    }

    fn request(&self) -> DcaRequest {
        DcaRequest {
            mode: self.mode.clone(),
            amount: self.amount,
            frequency: self.frequency.clone(),
            years: self.years,
            ticker: self.ticker.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the JSON body.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dca_backtest_core=info,dca=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = args.settings();
    info!(?settings, "starting DCA backtest");

    let calculator = DcaCalculator::new(settings);
    match calculator.respond_json(&args.request()).await {
        Ok((status, body)) => {
            println!("{body}");
            if status == 200 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("failed to serialize response: {e}");
            ExitCode::FAILURE
        }
    }
}
