use chrono::{Days, NaiveDate};
use log::info;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::portfolio_errors::PortfolioError;
use super::portfolio_traits::SnapshotRepositoryTrait;
use super::position_builder::build_positions;
use super::positions_model::{HistoricalPosition, Position};
use crate::assets::AssetRegistry;
use crate::errors::Result;
use crate::market_data::{MarketDataError, MarketDataRepositoryTrait};
use crate::trades::{Trade, TradeError, TradeRepositoryTrait};

/// Drives the position builder across dates, joining each day's positions
/// with that day's close prices into historical snapshots, and maintains
/// the current-position table.
pub struct SnapshotService {
    trade_repository: Arc<dyn TradeRepositoryTrait>,
    market_data_repository: Arc<dyn MarketDataRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    registry: Arc<AssetRegistry>,
}

impl SnapshotService {
    pub fn new(
        trade_repository: Arc<dyn TradeRepositoryTrait>,
        market_data_repository: Arc<dyn MarketDataRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        registry: Arc<AssetRegistry>,
    ) -> Self {
        Self {
            trade_repository,
            market_data_repository,
            snapshot_repository,
            registry,
        }
    }

    /// Builds one snapshot row per asset per date for every date in
    /// `target_dates` (ascending calendar days, continuity owned by the
    /// caller). Each date is an independent full FIFO walk.
    pub fn build_historical_positions(
        &self,
        target_dates: &[NaiveDate],
    ) -> Result<Vec<HistoricalPosition>> {
        let trades = self.trade_repository.get_all_trades()?;
        if trades.is_empty() {
            return Err(TradeError::NoTrades.into());
        }

        let price_index: HashMap<(String, NaiveDate), Decimal> = self
            .market_data_repository
            .get_historical_prices()?
            .into_iter()
            .map(|point| ((point.asset, point.date), point.price))
            .collect();

        let mut snapshots = Vec::new();
        for &date in target_dates {
            snapshots.extend(self.snapshot_for_date(&trades, &price_index, date)?);
        }
        Ok(snapshots)
    }

    /// One row per asset with any qualifying trade on or before `date`.
    /// Assets whose position was closed by then get an explicit zero row,
    /// so every date's slice of the audit trail is complete.
    fn snapshot_for_date(
        &self,
        trades: &[Trade],
        price_index: &HashMap<(String, NaiveDate), Decimal>,
        date: NaiveDate,
    ) -> Result<Vec<HistoricalPosition>> {
        let open = build_positions(trades, date, &self.registry);
        let open_by_asset: HashMap<&str, &Position> = open
            .iter()
            .map(|position| (position.asset.as_str(), position))
            .collect();

        let mut assets: BTreeSet<&str> = BTreeSet::new();
        for trade in trades {
            if !trade.excluded && trade.date <= date && self.registry.contains(&trade.asset) {
                assets.insert(trade.asset.as_str());
            }
        }

        let mut rows = Vec::with_capacity(assets.len());
        for asset in assets {
            let Some(position) = open_by_asset.get(asset) else {
                rows.push(HistoricalPosition::closed(asset, date));
                continue;
            };

            let close = price_index
                .get(&(asset.to_string(), date))
                .copied()
                .ok_or_else(|| PortfolioError::MissingClosePrice {
                    asset: asset.to_string(),
                    date,
                })?;

            if position.cost.is_zero() {
                return Err(PortfolioError::ZeroCostBasis {
                    asset: asset.to_string(),
                    date,
                }
                .into());
            }

            let value = position.quantity * close;
            let returns = (value - position.cost) / position.cost * dec!(100);

            rows.push(HistoricalPosition {
                asset: asset.to_string(),
                date,
                average_position_price: position.average_price,
                daily_close_price: close,
                quantity: position.quantity,
                cost: position.cost,
                value,
                returns,
            });
        }

        Ok(rows)
    }

    /// Builds and stores the snapshots for each day after the last stored
    /// one (or from the first trade, on an empty table), up to the latest
    /// date with price data.
    pub fn fill_historical_positions(&self) -> Result<usize> {
        let start = match self.snapshot_repository.latest_snapshot_date()? {
            Some(last) => last + Days::new(1),
            None => self
                .trade_repository
                .earliest_trade_date()?
                .ok_or(TradeError::NoTrades)?,
        };

        let end = self
            .market_data_repository
            .latest_price_date()?
            .ok_or(MarketDataError::NoHistoricalPrices)?;

        if start > end {
            info!("Historical positions already cover {}, nothing to fill", end);
            return Ok(0);
        }
        info!("Filling historical positions from {} to {}", start, end);

        let mut target_dates = Vec::new();
        let mut date = start;
        while date <= end {
            target_dates.push(date);
            date = date + Days::new(1);
        }

        let snapshots = self.build_historical_positions(&target_dates)?;
        let inserted = self.snapshot_repository.insert_historical_positions(&snapshots)?;
        info!("Stored {} historical position rows", inserted);
        Ok(inserted)
    }

    /// Recomputes the current open positions as of the latest trade date
    /// and transactionally replaces the position table.
    pub fn refresh_current_positions(&self) -> Result<Vec<Position>> {
        let as_of = self
            .trade_repository
            .latest_trade_date()?
            .ok_or(TradeError::NoTrades)?;
        let trades = self.trade_repository.get_all_trades()?;

        let positions = build_positions(&trades, as_of, &self.registry);
        self.snapshot_repository.replace_positions(&positions)?;
        info!("Rebuilt {} open positions as of {}", positions.len(), as_of);
        Ok(positions)
    }
}
