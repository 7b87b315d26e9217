use thiserror::Error;

use crate::errors::DatabaseError;

pub type Result<T> = std::result::Result<T, TradeError>;

#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] DatabaseError),

    #[error("No trades present, seed the ledger first")]
    NoTrades,

    #[error("Trade not found: {0}")]
    NotFound(String),

    #[error("Invalid trade data: {0}")]
    InvalidData(String),

    #[error("Trade source error: {0}")]
    SourceError(String),
}
