use async_trait::async_trait;
use chrono::{Days, Duration, NaiveDateTime, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::gap_filler::fill_forward;
use super::market_data_constants::DEFAULT_LIVE_PRICE_TTL_SECS;
use super::market_data_errors::MarketDataError;
use super::market_data_model::{LivePrice, PricePoint};
use super::market_data_traits::{MarketDataRepositoryTrait, MarketDataServiceTrait, PriceProvider};
use crate::assets::AssetRegistry;
use crate::errors::Result;

/// Serves current prices for the tracked universe out of the live-price
/// cache, refreshing from the upstream providers only once the cached
/// values exceed their TTL, and extends the stored daily close history.
pub struct MarketDataService {
    repository: Arc<dyn MarketDataRepositoryTrait>,
    providers: Vec<Arc<dyn PriceProvider>>,
    registry: Arc<AssetRegistry>,
    ttl: Duration,
}

impl MarketDataService {
    pub fn new(
        repository: Arc<dyn MarketDataRepositoryTrait>,
        providers: Vec<Arc<dyn PriceProvider>>,
        registry: Arc<AssetRegistry>,
    ) -> Self {
        Self {
            repository,
            providers,
            registry,
            ttl: Duration::seconds(DEFAULT_LIVE_PRICE_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// One round of provider calls covering the whole tracked universe,
    /// merged into a single mapping keyed by internal symbol.
    async fn fetch_all_prices(&self) -> std::result::Result<HashMap<String, Decimal>, MarketDataError> {
        let mut merged: HashMap<String, Decimal> = HashMap::new();

        for provider in &self.providers {
            let assets = self.registry.of_kind(provider.kind());
            if assets.is_empty() {
                continue;
            }
            let prices = provider.latest_prices(&assets).await?;
            merged.extend(prices);
        }

        // A partially priced universe is never served or persisted.
        for symbol in self.registry.symbols() {
            if !merged.contains_key(&symbol) {
                return Err(MarketDataError::MalformedResponse(format!(
                    "No provider returned a price for {}",
                    symbol
                )));
            }
        }

        Ok(merged)
    }

    fn cached_as_map(cached: &[LivePrice]) -> HashMap<String, Decimal> {
        cached
            .iter()
            .map(|live| (live.asset.clone(), live.price))
            .collect()
    }
}

#[async_trait]
impl MarketDataServiceTrait for MarketDataService {
    /// Returns the current price of every tracked asset.
    ///
    /// Cached values younger than the TTL are returned without touching the
    /// network. On a stale cache the providers are queried and the cache is
    /// replaced wholesale; if a provider response turns out malformed the
    /// stale values are served instead, indistinguishable from fresh ones.
    async fn get_current_prices(&self) -> Result<HashMap<String, Decimal>> {
        let cached = self.repository.get_live_prices()?;
        if cached.is_empty() {
            return Err(MarketDataError::CacheNotSeeded.into());
        }

        let fetched_at: NaiveDateTime = cached
            .iter()
            .map(|live| live.fetched_at)
            .max()
            .expect("cache is non-empty");
        let age = Utc::now().naive_utc() - fetched_at;

        if age < self.ttl {
            return Ok(Self::cached_as_map(&cached));
        }

        match self.fetch_all_prices().await {
            Ok(fresh) => {
                self.repository
                    .replace_live_prices(&fresh, Utc::now().naive_utc())?;
                Ok(fresh)
            }
            Err(MarketDataError::MalformedResponse(reason)) => {
                warn!(
                    "Live price refresh returned a malformed response ({}); serving cached prices from {}",
                    reason, fetched_at
                );
                Ok(Self::cached_as_map(&cached))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches and stores the daily close prices since the last one stored,
    /// forward-filled, up to yesterday (today's close does not exist yet).
    async fn fill_historical_prices(&self) -> Result<usize> {
        let last_stored = self
            .repository
            .latest_price_date()?
            .ok_or(MarketDataError::NoHistoricalPrices)?;

        let today = Utc::now().date_naive();
        let end = today - Days::new(1);
        if last_stored >= end {
            info!("Historical prices already cover {}, nothing to fill", last_stored);
            return Ok(0);
        }
        let start = last_stored + Days::new(1);
        info!("Filling historical prices from {} to {}", start, end);

        // Seed each asset's series with its last stored row so the fill
        // bridges a window in which the market never traded.
        let mut points: Vec<PricePoint> = self.repository.get_latest_historical_prices()?;

        for provider in &self.providers {
            for asset in self.registry.of_kind(provider.kind()) {
                let closes = provider.daily_closes(&asset, start, end).await?;
                points.extend(closes.into_iter().map(|(date, price)| PricePoint {
                    asset: asset.symbol.clone(),
                    date,
                    price,
                }));
            }
        }

        let filled = fill_forward(&points, end)?;
        let inserted = self.repository.insert_historical_prices(&filled)?;
        info!("Stored {} historical price rows", inserted);
        Ok(inserted)
    }
}
