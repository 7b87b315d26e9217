use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::assets::{AssetKind, AssetRegistry, TrackedAsset};
use crate::market_data::market_data_errors::{MarketDataError, Result};
use crate::market_data::{
    LivePrice, MarketDataRepositoryTrait, MarketDataService, MarketDataServiceTrait, PricePoint,
    PriceProvider,
};

// --- Mock repository ---

#[derive(Default)]
struct MockMarketDataRepository {
    live: RwLock<Vec<LivePrice>>,
    historical: RwLock<Vec<PricePoint>>,
}

impl MockMarketDataRepository {
    fn seeded(prices: &[(&str, Decimal)], fetched_at: NaiveDateTime) -> Arc<Self> {
        let live = prices
            .iter()
            .map(|(asset, price)| LivePrice {
                asset: asset.to_string(),
                price: *price,
                fetched_at,
            })
            .collect();
        Arc::new(Self {
            live: RwLock::new(live),
            historical: RwLock::new(Vec::new()),
        })
    }

    fn live_snapshot(&self) -> Vec<LivePrice> {
        self.live.read().unwrap().clone()
    }

    fn historical_snapshot(&self) -> Vec<PricePoint> {
        self.historical.read().unwrap().clone()
    }
}

impl MarketDataRepositoryTrait for MockMarketDataRepository {
    fn get_historical_prices(&self) -> Result<Vec<PricePoint>> {
        Ok(self.historical_snapshot())
    }

    fn get_latest_historical_prices(&self) -> Result<Vec<PricePoint>> {
        let mut latest: HashMap<String, PricePoint> = HashMap::new();
        for point in self.historical_snapshot() {
            let keep = latest
                .get(&point.asset)
                .map(|existing| existing.date < point.date)
                .unwrap_or(true);
            if keep {
                latest.insert(point.asset.clone(), point);
            }
        }
        Ok(latest.into_values().collect())
    }

    fn latest_price_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.historical_snapshot().iter().map(|p| p.date).max())
    }

    fn insert_historical_prices(&self, points: &[PricePoint]) -> Result<usize> {
        let mut historical = self.historical.write().unwrap();
        let mut inserted = 0;
        for point in points {
            if !historical
                .iter()
                .any(|p| p.asset == point.asset && p.date == point.date)
            {
                historical.push(point.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn get_live_prices(&self) -> Result<Vec<LivePrice>> {
        Ok(self.live_snapshot())
    }

    fn replace_live_prices(
        &self,
        prices: &HashMap<String, Decimal>,
        fetched_at: NaiveDateTime,
    ) -> Result<()> {
        let mut live = self.live.write().unwrap();
        *live = prices
            .iter()
            .map(|(asset, price)| LivePrice {
                asset: asset.clone(),
                price: *price,
                fetched_at,
            })
            .collect();
        Ok(())
    }
}

// --- Mock provider ---

enum ProviderBehavior {
    Prices(HashMap<String, Decimal>),
    Malformed,
    NetworkDown,
}

struct MockPriceProvider {
    kind: AssetKind,
    behavior: ProviderBehavior,
    calls: AtomicUsize,
    closes: HashMap<String, Vec<(NaiveDate, Decimal)>>,
}

impl MockPriceProvider {
    fn returning(kind: AssetKind, prices: &[(&str, Decimal)]) -> Arc<Self> {
        let prices = prices
            .iter()
            .map(|(asset, price)| (asset.to_string(), *price))
            .collect();
        Arc::new(Self {
            kind,
            behavior: ProviderBehavior::Prices(prices),
            calls: AtomicUsize::new(0),
            closes: HashMap::new(),
        })
    }

    fn malformed(kind: AssetKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior: ProviderBehavior::Malformed,
            calls: AtomicUsize::new(0),
            closes: HashMap::new(),
        })
    }

    fn network_down(kind: AssetKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior: ProviderBehavior::NetworkDown,
            calls: AtomicUsize::new(0),
            closes: HashMap::new(),
        })
    }

    fn with_closes(
        kind: AssetKind,
        asset: &str,
        closes: Vec<(NaiveDate, Decimal)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior: ProviderBehavior::Prices(HashMap::new()),
            calls: AtomicUsize::new(0),
            closes: HashMap::from([(asset.to_string(), closes)]),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for MockPriceProvider {
    fn name(&self) -> &'static str {
        "MOCK"
    }

    fn kind(&self) -> AssetKind {
        self.kind
    }

    async fn latest_prices(&self, assets: &[TrackedAsset]) -> Result<HashMap<String, Decimal>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ProviderBehavior::Prices(prices) => Ok(assets
                .iter()
                .filter_map(|asset| {
                    prices
                        .get(&asset.symbol)
                        .map(|price| (asset.symbol.clone(), *price))
                })
                .collect()),
            ProviderBehavior::Malformed => Err(MarketDataError::MalformedResponse(
                "missing expected field".to_string(),
            )),
            ProviderBehavior::NetworkDown => Err(MarketDataError::ProviderError(
                "connection refused".to_string(),
            )),
        }
    }

    async fn daily_closes(
        &self,
        asset: &TrackedAsset,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Decimal)>> {
        Ok(self
            .closes
            .get(&asset.symbol)
            .map(|closes| {
                closes
                    .iter()
                    .filter(|(date, _)| *date >= start && *date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

// --- Helpers ---

fn tracked(symbol: &str, kind: AssetKind) -> TrackedAsset {
    TrackedAsset {
        symbol: symbol.to_string(),
        kind,
        provider_id: symbol.to_lowercase(),
        platform: "test".to_string(),
        market: "TEST".to_string(),
        segment: "Core".to_string(),
        description: String::new(),
        target_allocation: Decimal::ZERO,
    }
}

fn token_registry() -> Arc<AssetRegistry> {
    Arc::new(AssetRegistry::new(vec![
        tracked("BTC", AssetKind::Token),
        tracked("ETH", AssetKind::Token),
    ]))
}

fn fresh_timestamp() -> NaiveDateTime {
    Utc::now().naive_utc() - Duration::seconds(30)
}

fn stale_timestamp() -> NaiveDateTime {
    Utc::now().naive_utc() - Duration::minutes(10)
}

// --- Tests ---

#[tokio::test]
async fn fresh_cache_is_served_without_calling_providers() {
    let repository =
        MockMarketDataRepository::seeded(&[("BTC", dec!(100)), ("ETH", dec!(50))], fresh_timestamp());
    let provider = MockPriceProvider::returning(AssetKind::Token, &[]);
    let service = MarketDataService::new(
        repository.clone(),
        vec![provider.clone()],
        token_registry(),
    );

    let prices = service.get_current_prices().await.unwrap();
    assert_eq!(prices["BTC"], dec!(100));
    assert_eq!(prices["ETH"], dec!(50));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn stale_cache_is_replaced_wholesale() {
    let repository =
        MockMarketDataRepository::seeded(&[("BTC", dec!(100)), ("ETH", dec!(50))], stale_timestamp());
    let provider =
        MockPriceProvider::returning(AssetKind::Token, &[("BTC", dec!(110)), ("ETH", dec!(55))]);
    let service = MarketDataService::new(
        repository.clone(),
        vec![provider.clone()],
        token_registry(),
    );

    let prices = service.get_current_prices().await.unwrap();
    assert_eq!(provider.call_count(), 1);
    assert_eq!(prices["BTC"], dec!(110));

    let stored = repository.live_snapshot();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|p| p.fetched_at > stale_timestamp()));
    assert_eq!(
        stored.iter().find(|p| p.asset == "ETH").unwrap().price,
        dec!(55)
    );
}

#[tokio::test]
async fn malformed_response_falls_back_to_cached_prices() {
    let stale = stale_timestamp();
    let repository = MockMarketDataRepository::seeded(&[("BTC", dec!(100)), ("ETH", dec!(50))], stale);
    let provider = MockPriceProvider::malformed(AssetKind::Token);
    let service = MarketDataService::new(
        repository.clone(),
        vec![provider.clone()],
        token_registry(),
    );

    let prices = service.get_current_prices().await.unwrap();
    assert_eq!(provider.call_count(), 1);
    assert_eq!(prices["BTC"], dec!(100));
    assert_eq!(prices["ETH"], dec!(50));

    // Nothing was persisted: same rows, same fetch timestamp.
    let stored = repository.live_snapshot();
    assert!(stored.iter().all(|p| p.fetched_at == stale));
}

#[tokio::test]
async fn partial_provider_coverage_counts_as_malformed() {
    // ETH is tracked but the provider only knows BTC; the refresh must not
    // persist a partial mapping, so the stale cache is served instead.
    let stale = stale_timestamp();
    let repository = MockMarketDataRepository::seeded(&[("BTC", dec!(100)), ("ETH", dec!(50))], stale);
    let provider = MockPriceProvider::returning(AssetKind::Token, &[("BTC", dec!(110))]);
    let service = MarketDataService::new(
        repository.clone(),
        vec![provider.clone()],
        token_registry(),
    );

    let prices = service.get_current_prices().await.unwrap();
    assert_eq!(prices["BTC"], dec!(100));
    assert!(repository.live_snapshot().iter().all(|p| p.fetched_at == stale));
}

#[tokio::test]
async fn non_malformed_provider_errors_propagate() {
    let repository =
        MockMarketDataRepository::seeded(&[("BTC", dec!(100)), ("ETH", dec!(50))], stale_timestamp());
    let provider = MockPriceProvider::network_down(AssetKind::Token);
    let service = MarketDataService::new(repository, vec![provider], token_registry());

    assert!(service.get_current_prices().await.is_err());
}

#[tokio::test]
async fn empty_cache_is_a_precondition_failure() {
    let repository = Arc::new(MockMarketDataRepository::default());
    let provider = MockPriceProvider::returning(AssetKind::Token, &[("BTC", dec!(100))]);
    let service = MarketDataService::new(repository, vec![provider], token_registry());

    assert!(service.get_current_prices().await.is_err());
}

#[tokio::test]
async fn fill_historical_prices_bridges_gaps_since_last_stored_date() {
    let repository = Arc::new(MockMarketDataRepository::default());
    let today = Utc::now().date_naive();
    let last_stored = today - Duration::days(5);
    repository
        .insert_historical_prices(&[
            PricePoint {
                asset: "BTC".to_string(),
                date: last_stored,
                price: dec!(100),
            },
            PricePoint {
                asset: "ETH".to_string(),
                date: last_stored,
                price: dec!(50),
            },
        ])
        .unwrap();

    // The provider only has a BTC close two days after the watermark; the
    // other days come from the forward fill, seeded by the stored rows.
    let provider = MockPriceProvider::with_closes(
        AssetKind::Token,
        "BTC",
        vec![(last_stored + Duration::days(2), dec!(120))],
    );
    let service = MarketDataService::new(repository.clone(), vec![provider], token_registry());

    let inserted = service.fill_historical_prices().await.unwrap();
    // Four new days per asset (watermark+1 ..= yesterday).
    assert_eq!(inserted, 8);

    let stored = repository.historical_snapshot();
    let btc_day3 = stored
        .iter()
        .find(|p| p.asset == "BTC" && p.date == last_stored + Duration::days(3))
        .unwrap();
    assert_eq!(btc_day3.price, dec!(120));

    let eth_yesterday = stored
        .iter()
        .find(|p| p.asset == "ETH" && p.date == today - Duration::days(1))
        .unwrap();
    assert_eq!(eth_yesterday.price, dec!(50));
}

#[tokio::test]
async fn fill_historical_prices_requires_seeded_history() {
    let repository = Arc::new(MockMarketDataRepository::default());
    let provider = MockPriceProvider::returning(AssetKind::Token, &[]);
    let service = MarketDataService::new(repository, vec![provider], token_registry());

    assert!(service.fill_historical_prices().await.is_err());
}
