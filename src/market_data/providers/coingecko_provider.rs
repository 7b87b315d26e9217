use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::assets::{AssetKind, TrackedAsset};
use crate::market_data::market_data_errors::{MarketDataError, Result};
use crate::market_data::market_data_traits::PriceProvider;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const VS_CURRENCY: &str = "usd";

/// Crypto token prices from the CoinGecko API. Assets are addressed by
/// their CoinGecko coin id (`provider_id`), not the ticker.
pub struct CoinGeckoProvider {
    client: Client,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        CoinGeckoProvider {
            client: Client::new(),
        }
    }

    async fn fetch_json(&self, path: &str, params: Vec<(&str, String)>) -> Result<String> {
        let url = reqwest::Url::parse_with_params(&format!("{}{}", BASE_URL, path), &params)
            .map_err(|e| MarketDataError::ProviderError(format!("Failed to build URL: {}", e)))?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MarketDataError::ProviderError(format!(
                "CoinGecko API error ({}): {}",
                status, error_body
            )));
        }

        Ok(response.text().await?)
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Option<Vec<(i64, Decimal)>>,
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &'static str {
        "COINGECKO"
    }

    fn kind(&self) -> AssetKind {
        AssetKind::Token
    }

    async fn latest_prices(&self, assets: &[TrackedAsset]) -> Result<HashMap<String, Decimal>> {
        let ids: Vec<&str> = assets.iter().map(|a| a.provider_id.as_str()).collect();
        let params = vec![
            ("ids", ids.join(",")),
            ("vs_currencies", VS_CURRENCY.to_string()),
        ];

        let response_text = self.fetch_json("/simple/price", params).await?;
        let quoted: HashMap<String, HashMap<String, Decimal>> =
            serde_json::from_str(&response_text).map_err(|e| {
                MarketDataError::MalformedResponse(format!("Unexpected price payload: {}", e))
            })?;

        let mut prices = HashMap::new();
        for asset in assets {
            let price = quoted
                .get(&asset.provider_id)
                .and_then(|entry| entry.get(VS_CURRENCY))
                .ok_or_else(|| {
                    MarketDataError::MalformedResponse(format!(
                        "Price payload is missing {} ({})",
                        asset.symbol, asset.provider_id
                    ))
                })?;
            prices.insert(asset.symbol.clone(), *price);
        }

        Ok(prices)
    }

    async fn daily_closes(
        &self,
        asset: &TrackedAsset,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Decimal)>> {
        let from = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let to = end.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();

        let params = vec![
            ("vs_currency", VS_CURRENCY.to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ];
        let path = format!("/coins/{}/market_chart/range", asset.provider_id);
        let response_text = self.fetch_json(&path, params).await?;
        let chart: MarketChartResponse = serde_json::from_str(&response_text).map_err(|e| {
            MarketDataError::MalformedResponse(format!(
                "Unexpected market chart payload for {}: {}",
                asset.symbol, e
            ))
        })?;

        let samples = chart.prices.ok_or_else(|| {
            MarketDataError::MalformedResponse(format!(
                "Market chart for {} is missing the prices array",
                asset.symbol
            ))
        })?;

        // The API returns intraday samples for short ranges; keep the last
        // sample of each day as that day's close.
        let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for (timestamp_ms, price) in samples {
            if let Some(dt) = DateTime::from_timestamp_millis(timestamp_ms) {
                by_day.insert(dt.date_naive(), price);
            }
        }

        Ok(by_day.into_iter().collect())
    }
}
