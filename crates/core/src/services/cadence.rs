use crate::models::asset::AssetClass;
use crate::models::frequency::Frequency;

/// Purchase cadence for one simulation: how far apart purchases are and how many there are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceParameters {
    /// Trading days between consecutive purchases
    pub step: usize,
    /// Number of purchases over the whole horizon
    pub iterations: usize,
}

impl CadenceParameters {
    /// Trading days of history the walk needs.
    pub fn required_history(&self) -> usize {
        self.step * self.iterations
    }
}

/// Maps a frequency and an asset's market calendar to a purchase cadence.
///
/// Crypto trades every calendar day, equities about five days a week, so the
/// same calendar frequency is a shorter trading-day step for equities.
pub struct CadencePolicy;

impl CadencePolicy {
    /// Trading days between purchases.
    pub fn step_size(class: AssetClass, frequency: Frequency) -> usize {
        match (class, frequency) {
            (_, Frequency::Daily) => 1,
            (AssetClass::Crypto, Frequency::Weekly) => 7,
            (AssetClass::Crypto, Frequency::Biweekly) => 14,
            (AssetClass::Crypto, Frequency::Monthly) => 30,
            (AssetClass::Equity, Frequency::Weekly) => 5,
            (AssetClass::Equity, Frequency::Biweekly) => 10,
            (AssetClass::Equity, Frequency::Monthly) => 21,
        }
    }

    /// Purchases per year of lookback.
    ///
    /// Fixed per-frequency counts, the same for every asset class:
    /// d → 364, w → 52, b → 26, m → 12. This is NOT a trading-day budget
    /// divided by the step (364 crypto / 260 equity); the two disagree, e.g.
    /// an equity bought daily for a year is 364 purchases here, not 260, and
    /// so walks back about 17 months of exchange days.
    pub fn purchases_per_year(frequency: Frequency) -> usize {
        match frequency {
            Frequency::Daily => 364,
            Frequency::Weekly => 52,
            Frequency::Biweekly => 26,
            Frequency::Monthly => 12,
        }
    }

    /// Total purchases over `years`.
    pub fn iteration_count(_class: AssetClass, frequency: Frequency, years: u32) -> usize {
        Self::purchases_per_year(frequency) * years as usize
    }

    pub fn parameters(class: AssetClass, frequency: Frequency, years: u32) -> CadenceParameters {
        CadenceParameters {
            step: Self::step_size(class, frequency),
            iterations: Self::iteration_count(class, frequency, years),
        }
    }
}
