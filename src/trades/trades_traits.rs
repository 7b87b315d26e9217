use async_trait::async_trait;
use chrono::NaiveDate;

use super::trades_errors::Result;
use super::trades_model::Trade;

pub trait TradeRepositoryTrait: Send + Sync {
    /// All trades, date ascending (ties broken by id for determinism).
    fn get_all_trades(&self) -> Result<Vec<Trade>>;
    fn earliest_trade_date(&self) -> Result<Option<NaiveDate>>;
    fn latest_trade_date(&self) -> Result<Option<NaiveDate>>;
    /// Insert-or-ignore on id; returns the number of rows actually written.
    fn insert_trades(&self, trades: &[Trade]) -> Result<usize>;
    /// Replaces the stored row with corrected values under the same id.
    fn upsert_trade(&self, trade: &Trade) -> Result<()>;
    fn set_excluded(&self, trade_id: &str, excluded: bool) -> Result<()>;
}

/// An injected upstream of trade executions (a broker or exchange client).
/// The engine never owns these clients; the service layer constructs them
/// and passes a handle in per sync run.
#[async_trait]
pub trait TradeSource: Send + Sync {
    fn platform(&self) -> &'static str;
    /// Fetches executions on or after `since`, newest last.
    async fn fetch_trades(&self, since: NaiveDate) -> Result<Vec<Trade>>;
}
