use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::portfolio_errors::PortfolioError;
use super::portfolio_traits::SnapshotRepositoryTrait;
use super::positions_model::{EnrichedPosition, PerformancePoint};
use crate::assets::AssetRegistry;
use crate::errors::Result;
use crate::market_data::MarketDataServiceTrait;

/// Read-side views over the derived tables: current positions enriched
/// with live prices and registry metadata, and portfolio performance
/// aggregated from the historical snapshots.
pub struct PortfolioService {
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    market_data: Arc<dyn MarketDataServiceTrait>,
    registry: Arc<AssetRegistry>,
}

impl PortfolioService {
    pub fn new(
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        market_data: Arc<dyn MarketDataServiceTrait>,
        registry: Arc<AssetRegistry>,
    ) -> Self {
        Self {
            snapshot_repository,
            market_data,
            registry,
        }
    }

    /// Joins each current position with its live price and computes value,
    /// returns and the share of the whole portfolio it represents.
    pub async fn get_enriched_positions(&self) -> Result<Vec<EnrichedPosition>> {
        let positions = self.snapshot_repository.get_all_positions()?;
        if positions.is_empty() {
            return Ok(Vec::new());
        }

        let live_prices = self.market_data.get_current_prices().await?;

        let mut enriched = Vec::with_capacity(positions.len());
        for position in &positions {
            let current_price = live_prices
                .get(&position.asset)
                .copied()
                .ok_or_else(|| PortfolioError::MissingLivePrice(position.asset.clone()))?;

            if position.cost.is_zero() {
                return Err(PortfolioError::InvalidData(format!(
                    "Stored position {} has a zero cost basis",
                    position.asset
                ))
                .into());
            }

            let value = current_price * position.quantity;
            let returns = (value - position.cost) / position.cost * dec!(100);

            let (market, segment, description, target_allocation) =
                match self.registry.get(&position.asset) {
                    Some(asset) => (
                        asset.market.clone(),
                        asset.segment.clone(),
                        asset.description.clone(),
                        asset.target_allocation,
                    ),
                    None => (String::new(), String::new(), String::new(), Decimal::ZERO),
                };

            enriched.push(EnrichedPosition {
                asset: position.asset.clone(),
                market,
                segment,
                description,
                current_price,
                average_price: position.average_price,
                quantity: position.quantity,
                cost: position.cost,
                value,
                returns,
                current_allocation: Decimal::ZERO, // filled in below
                target_allocation,
            });
        }

        let total_value: Decimal = enriched.iter().map(|p| p.value).sum();
        if !total_value.is_zero() {
            for position in &mut enriched {
                position.current_allocation = position.value / total_value * dec!(100);
            }
        }

        Ok(enriched)
    }

    /// Portfolio-level cost, value and return per snapshot date, optionally
    /// windowed by `start_date` and restricted to `assets`.
    pub fn get_performance(
        &self,
        start_date: Option<NaiveDate>,
        assets: &[String],
    ) -> Result<Vec<PerformancePoint>> {
        let snapshots = self
            .snapshot_repository
            .get_historical_positions(start_date, assets)?;

        let mut by_date: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
        for snapshot in snapshots {
            let entry = by_date.entry(snapshot.date).or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += snapshot.cost;
            entry.1 += snapshot.value;
        }

        Ok(by_date
            .into_iter()
            .map(|(date, (cost, value))| {
                let returns = if cost.is_zero() {
                    // A date where every selected position was closed has no
                    // meaningful return; zero keeps the series total.
                    debug!("Zero aggregate cost on {}; reporting zero return", date);
                    Decimal::ZERO
                } else {
                    (value - cost) / cost * dec!(100)
                };
                PerformancePoint {
                    date,
                    cost,
                    value,
                    returns,
                }
            })
            .collect())
    }
}
