use tracing::debug;

use crate::models::asset::AssetClass;

use super::coincap::CoinCapProvider;
#[cfg(not(target_arch = "wasm32"))]
use super::yahoo_finance::YahooFinanceProvider;
use super::traits::PriceProvider;

/// Registry of all available price providers.
///
/// Routes requests to the providers that support an `AssetClass`, in
/// registration order. Earlier registrations are tried first.
pub struct PriceProviderRegistry {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl PriceProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with the default providers.
    ///
    /// Yahoo Finance is primary for both classes; CoinCap backs up crypto.
    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();

        // Yahoo Finance — equities and BTC-USD, no API key needed.
        // Not available on WASM (uses native reqwest/tokio connectors)
        #[cfg(not(target_arch = "wasm32"))]
        {
            match YahooFinanceProvider::new() {
                Ok(yahoo) => registry.register(Box::new(yahoo)),
                Err(e) => debug!("Yahoo Finance unavailable: {e}"),
            }
        }

        // CoinCap — crypto fallback, no API key needed
        registry.register(Box::new(CoinCapProvider::new()));

        registry
    }

    /// Register a new price provider.
    pub fn register(&mut self, provider: Box<dyn PriceProvider>) {
        debug!(provider = provider.name(), "registered price provider");
        self.providers.push(provider);
    }

    /// Find the first provider that supports the given asset class.
    pub fn get_provider_for(&self, class: AssetClass) -> Option<&dyn PriceProvider> {
        self.providers
            .iter()
            .find(|p| p.supported_asset_classes().contains(&class))
            .map(|p| p.as_ref())
    }

    /// Return ALL providers that support the given asset class, ordered by registration priority.
    /// Used for fallback: if the first provider fails, try the next one.
    pub fn get_providers_for(&self, class: AssetClass) -> Vec<&dyn PriceProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_asset_classes().contains(&class))
            .map(|p| p.as_ref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for PriceProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
