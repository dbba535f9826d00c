pub mod cadence;
pub mod dca_service;
pub mod price_service;
pub mod simulator;
