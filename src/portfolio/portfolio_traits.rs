use chrono::NaiveDate;

use super::portfolio_errors::Result;
use super::positions_model::{HistoricalPosition, Position};

pub trait SnapshotRepositoryTrait: Send + Sync {
    fn get_all_positions(&self) -> Result<Vec<Position>>;
    /// Transactional delete-all plus bulk insert; observers never see an
    /// empty position table mid-refresh.
    fn replace_positions(&self, positions: &[Position]) -> Result<()>;

    fn latest_snapshot_date(&self) -> Result<Option<NaiveDate>>;
    /// Insert-or-ignore on `(asset, date)`; re-running a backfill over the
    /// same range writes nothing new.
    fn insert_historical_positions(&self, rows: &[HistoricalPosition]) -> Result<usize>;
    /// Snapshots filtered by an optional start date and optional asset set,
    /// date ascending.
    fn get_historical_positions(
        &self,
        start_date: Option<NaiveDate>,
        assets: &[String],
    ) -> Result<Vec<HistoricalPosition>>;
}
