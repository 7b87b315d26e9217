pub(crate) mod coingecko_provider;
pub(crate) mod finnhub_provider;

pub use coingecko_provider::CoinGeckoProvider;
pub use finnhub_provider::FinnhubProvider;
