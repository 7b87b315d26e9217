use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::market_data_errors::Result;
use super::market_data_model::{LivePrice, PricePoint};
use crate::assets::{AssetKind, TrackedAsset};

/// An external source of current and historical prices for one kind of
/// asset. Implementations wrap a single upstream HTTP API.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Which slice of the tracked universe this provider serves.
    fn kind(&self) -> AssetKind;

    /// Current price for every requested asset, keyed by the internal
    /// symbol. Must either price every asset or fail the whole call;
    /// a response missing an expected field or asset surfaces as
    /// `MarketDataError::MalformedResponse`.
    async fn latest_prices(&self, assets: &[TrackedAsset]) -> Result<HashMap<String, Decimal>>;

    /// Daily close prices for one asset over `[start, end]`, ascending.
    /// Non-trading days are simply absent.
    async fn daily_closes(
        &self,
        asset: &TrackedAsset,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Decimal)>>;
}

pub trait MarketDataRepositoryTrait: Send + Sync {
    fn get_historical_prices(&self) -> Result<Vec<PricePoint>>;
    /// Per-asset row with the greatest stored date.
    fn get_latest_historical_prices(&self) -> Result<Vec<PricePoint>>;
    fn latest_price_date(&self) -> Result<Option<NaiveDate>>;
    /// Insert-or-ignore on `(asset, date)`; first write wins.
    fn insert_historical_prices(&self, points: &[PricePoint]) -> Result<usize>;

    fn get_live_prices(&self) -> Result<Vec<LivePrice>>;
    /// Replaces the whole cache (delete-all, bulk insert) in one
    /// transaction so readers never observe a partial cache.
    fn replace_live_prices(
        &self,
        prices: &HashMap<String, Decimal>,
        fetched_at: NaiveDateTime,
    ) -> Result<()>;
}

#[async_trait]
pub trait MarketDataServiceTrait: Send + Sync {
    /// Best-available current price per tracked asset. May be a fresh
    /// fetch or the cached values, indistinguishable to the caller.
    async fn get_current_prices(&self) -> crate::errors::Result<HashMap<String, Decimal>>;

    /// Extends the stored daily close history up to yesterday, gap-filled.
    async fn fill_historical_prices(&self) -> crate::errors::Result<usize>;
}
