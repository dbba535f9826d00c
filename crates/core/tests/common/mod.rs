// ═══════════════════════════════════════════════════════════════════
// Shared test fixtures — scripted provider, controllable clock
// ═══════════════════════════════════════════════════════════════════
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dca_backtest_core::errors::CoreError;
use dca_backtest_core::models::asset::AssetClass;
use dca_backtest_core::models::price::PricePoint;
use dca_backtest_core::providers::traits::PriceProvider;
use dca_backtest_core::services::price_service::Clock;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// `len` consecutive daily closes ending on `last`, produced by `price(i)`.
pub fn daily_closes(last: NaiveDate, len: usize, price: impl Fn(usize) -> f64) -> Vec<PricePoint> {
    (0..len)
        .map(|i| PricePoint {
            date: last - chrono::Duration::days((len - 1 - i) as i64),
            price: price(i),
        })
        .collect()
}

// ── Clock ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl TestClock {
    pub fn at(y: i32, m: u32, day: u32, h: u32, min: u32) -> Self {
        Self(Arc::new(Mutex::new(
            Utc.with_ymd_and_hms(y, m, day, h, min, 0).unwrap(),
        )))
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }

    pub fn clock(&self) -> Clock {
        let inner = self.0.clone();
        Arc::new(move || *inner.lock().unwrap())
    }
}

// ── Scripted provider ───────────────────────────────────────────────

/// Call log shared between a test and the provider it boxed into a registry.
#[derive(Clone, Default)]
pub struct Calls {
    pub spot: Arc<AtomicUsize>,
    pub history: Arc<AtomicUsize>,
    pub ranges: Arc<Mutex<Vec<(String, NaiveDate, NaiveDate)>>>,
}

impl Calls {
    pub fn spot(&self) -> usize {
        self.spot.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> usize {
        self.history.load(Ordering::SeqCst)
    }

    pub fn ranges(&self) -> Vec<(String, NaiveDate, NaiveDate)> {
        self.ranges.lock().unwrap().clone()
    }
}

/// Provider serving fixed spot prices and closes from memory.
pub struct ScriptedProvider {
    pub name: String,
    pub classes: Vec<AssetClass>,
    pub spot: Arc<Mutex<HashMap<String, f64>>>,
    pub closes: Arc<Mutex<HashMap<String, Vec<PricePoint>>>>,
    /// While set, every call fails with an API error.
    pub outage: Arc<AtomicBool>,
    pub calls: Calls,
}

impl ScriptedProvider {
    pub fn new(name: &str, classes: Vec<AssetClass>) -> Self {
        Self {
            name: name.to_string(),
            classes,
            spot: Arc::default(),
            closes: Arc::default(),
            outage: Arc::default(),
            calls: Calls::default(),
        }
    }

    pub fn all_classes(name: &str) -> Self {
        Self::new(name, vec![AssetClass::Crypto, AssetClass::Equity])
    }

    pub fn with_spot(self, ticker: &str, price: f64) -> Self {
        self.spot.lock().unwrap().insert(ticker.to_uppercase(), price);
        self
    }

    pub fn with_closes(self, ticker: &str, closes: Vec<PricePoint>) -> Self {
        self.closes.lock().unwrap().insert(ticker.to_uppercase(), closes);
        self
    }

    fn check_outage(&self, ticker: &str) -> Result<(), CoreError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                provider: self.name.clone(),
                message: format!("HTTP 503 for {ticker}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PriceProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        self.classes.clone()
    }

    async fn get_current_price(&self, ticker: &str) -> Result<f64, CoreError> {
        self.calls.spot.fetch_add(1, Ordering::SeqCst);
        self.check_outage(ticker)?;
        self.spot
            .lock()
            .unwrap()
            .get(&ticker.to_uppercase())
            .copied()
            .ok_or_else(|| CoreError::PriceUnavailable {
                ticker: ticker.to_string(),
                reason: format!("{} has no quote", self.name),
            })
    }

    async fn get_price_range(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.calls.history.fetch_add(1, Ordering::SeqCst);
        self.calls
            .ranges
            .lock()
            .unwrap()
            .push((ticker.to_uppercase(), from, to));
        self.check_outage(ticker)?;
        let points: Vec<PricePoint> = self
            .closes
            .lock()
            .unwrap()
            .get(&ticker.to_uppercase())
            .map(|all| {
                all.iter()
                    .filter(|p| p.date >= from && p.date <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if points.is_empty() {
            return Err(CoreError::HistoryUnavailable {
                ticker: ticker.to_string(),
                reason: format!("{} has no closes", self.name),
            });
        }
        Ok(points)
    }
}

/// Provider that fails every call with an API error.
pub struct FailingProvider {
    pub classes: Vec<AssetClass>,
    pub calls: Calls,
}

impl FailingProvider {
    pub fn new(classes: Vec<AssetClass>) -> Self {
        Self {
            classes,
            calls: Calls::default(),
        }
    }
}

#[async_trait]
impl PriceProvider for FailingProvider {
    fn name(&self) -> &str {
        "Failing"
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        self.classes.clone()
    }

    async fn get_current_price(&self, ticker: &str) -> Result<f64, CoreError> {
        self.calls.spot.fetch_add(1, Ordering::SeqCst);
        Err(CoreError::Api {
            provider: "Failing".into(),
            message: format!("Simulated failure for {ticker}"),
        })
    }

    async fn get_price_range(
        &self,
        ticker: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.calls.history.fetch_add(1, Ordering::SeqCst);
        Err(CoreError::Api {
            provider: "Failing".into(),
            message: format!("Simulated failure for {ticker}"),
        })
    }
}
