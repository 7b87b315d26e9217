pub(crate) mod gap_filler;
pub(crate) mod market_data_constants;
pub(crate) mod market_data_errors;
pub(crate) mod market_data_model;
pub(crate) mod market_data_repository;
pub(crate) mod market_data_service;
pub(crate) mod market_data_traits;
pub(crate) mod providers;

#[cfg(test)]
mod market_data_service_tests;

pub use gap_filler::fill_forward;
pub use market_data_constants::*;
pub use market_data_errors::MarketDataError;
pub use market_data_model::{LivePrice, LivePriceDB, PricePoint, PricePointDB};
pub use market_data_repository::MarketDataRepository;
pub use market_data_service::MarketDataService;
pub use market_data_traits::{MarketDataRepositoryTrait, MarketDataServiceTrait, PriceProvider};
pub use providers::{CoinGeckoProvider, FinnhubProvider};
