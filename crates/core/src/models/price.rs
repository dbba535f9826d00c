use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single daily close (date → price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Daily closes for one ticker, oldest first.
///
/// Dates are strictly increasing: no duplicates, gaps allowed (non-trading
/// days are simply absent). Every constructor and mutator keeps that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from points in any order. A later point for an
    /// already-seen date replaces the earlier one.
    pub fn from_points(points: impl IntoIterator<Item = PricePoint>) -> Self {
        let mut series = Self::new();
        for point in points {
            series.upsert(point.date, point.price);
        }
        series
    }

    /// Insert or replace the close for `date`, keeping the series sorted.
    pub fn upsert(&mut self, date: NaiveDate, price: f64) {
        // Appends are the common case (provider data arrives oldest first).
        if self.points.last().map_or(true, |p| p.date < date) {
            self.points.push(PricePoint { date, price });
            return;
        }
        match self.points.binary_search_by_key(&date, |p| p.date) {
            Ok(idx) => self.points[idx].price = price,
            Err(idx) => self.points.insert(idx, PricePoint { date, price }),
        }
    }

    /// Merge freshly fetched points into the series.
    /// Returns how many new dates were added.
    pub fn merge(&mut self, points: &[PricePoint]) -> usize {
        let before = self.points.len();
        for point in points {
            self.upsert(point.date, point.price);
        }
        self.points.len() - before
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Close `offset` trading days back from the end; `offset == 1` is the
    /// most recent entry. `None` when `offset` is 0 or beyond the series.
    pub fn price_back(&self, offset: usize) -> Option<f64> {
        if offset == 0 {
            return None;
        }
        self.points
            .len()
            .checked_sub(offset)
            .map(|idx| self.points[idx].price)
    }

    /// Points with `from <= date <= to`, located by binary search.
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> &[PricePoint] {
        let start = self
            .points
            .binary_search_by_key(&from, |p| p.date)
            .unwrap_or_else(|pos| pos);
        let end = self
            .points
            .binary_search_by_key(&to, |p| p.date)
            .map(|pos| pos + 1)
            .unwrap_or_else(|pos| pos);
        if start >= end {
            return &[];
        }
        &self.points[start..end]
    }
}

/// A cached spot price and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotQuote {
    pub price: f64,
    pub fetched_at: DateTime<Utc>,
    /// Number of times this quote has been (re)fetched.
    pub update_count: u32,
}

/// A cached price history and its refresh bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub series: PriceSeries,
    /// UTC date of the last successful refresh.
    pub last_updated: Option<NaiveDate>,
    /// Number of refreshes, including the initial backfill.
    pub update_count: u32,
}

/// In-memory cache of spot prices and histories, keyed by uppercased ticker.
///
/// Holds the operational counters of the price layer; nothing here is
/// visible to the simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceCache {
    pub spot: HashMap<String, SpotQuote>,
    pub history: HashMap<String, HistoryEntry>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached spot quote. Returns None if never fetched.
    pub fn get_spot(&self, ticker: &str) -> Option<&SpotQuote> {
        self.spot.get(&ticker.to_uppercase())
    }

    /// Record a freshly fetched spot price.
    pub fn set_spot(&mut self, ticker: &str, price: f64, fetched_at: DateTime<Utc>) {
        let quote = self
            .spot
            .entry(ticker.to_uppercase())
            .or_insert(SpotQuote {
                price,
                fetched_at,
                update_count: 0,
            });
        quote.price = price;
        quote.fetched_at = fetched_at;
        quote.update_count += 1;
    }

    pub fn get_history(&self, ticker: &str) -> Option<&HistoryEntry> {
        self.history.get(&ticker.to_uppercase())
    }

    /// Merge fetched points into a ticker's history and stamp the refresh.
    /// Returns how many new dates were added.
    pub fn merge_history(&mut self, ticker: &str, points: &[PricePoint], today: NaiveDate) -> usize {
        let entry = self.history.entry(ticker.to_uppercase()).or_default();
        let added = entry.series.merge(points);
        entry.last_updated = Some(today);
        entry.update_count += 1;
        added
    }

    /// Total number of cached daily closes across all tickers.
    pub fn total_entries(&self) -> usize {
        self.history.values().map(|h| h.series.len()).sum()
    }

    /// Clear all cached data.
    pub fn clear(&mut self) {
        self.spot.clear();
        self.history.clear();
    }
}
