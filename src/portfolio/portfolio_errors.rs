use chrono::NaiveDate;
use thiserror::Error;

use crate::errors::DatabaseError;

pub type Result<T> = std::result::Result<T, PortfolioError>;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] DatabaseError),

    /// An open position with no close price for its snapshot date means the
    /// price history is behind the trade ledger. Backfill prices first.
    #[error("No close price for {asset} on {date}")]
    MissingClosePrice { asset: String, date: NaiveDate },

    /// Returns cannot be computed against a zero cost basis; an open lot
    /// set with zero cost is corrupt input, not a value to coerce.
    #[error("Position {asset} on {date} has a zero cost basis")]
    ZeroCostBasis { asset: String, date: NaiveDate },

    #[error("No live price available for held asset {0}")]
    MissingLivePrice(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
