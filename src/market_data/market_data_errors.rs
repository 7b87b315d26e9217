use chrono::NaiveDate;
use thiserror::Error;

use crate::errors::DatabaseError;

pub type Result<T> = std::result::Result<T, MarketDataError>;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] DatabaseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The upstream answered, but the payload is missing an expected
    /// field or key. Consumers of the live cache recover from this class
    /// by falling back to the stale cached prices; everything else bubbles.
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("No cached live prices present, seed the cache first")]
    CacheNotSeeded,

    #[error("No historical prices present, seed the price history first")]
    NoHistoricalPrices,

    #[error("No known price for {asset} on or before {date}")]
    MissingLeadingPrice { asset: String, date: NaiveDate },
}
