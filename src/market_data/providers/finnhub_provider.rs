use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use futures::future::join_all;
use log::warn;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::assets::{AssetKind, TrackedAsset};
use crate::market_data::market_data_errors::{MarketDataError, Result};
use crate::market_data::market_data_traits::PriceProvider;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Stock and ETF prices from the Finnhub API.
pub struct FinnhubProvider {
    client: Client,
    token: String,
}

impl FinnhubProvider {
    pub fn new(token: String) -> Self {
        FinnhubProvider {
            client: Client::new(),
            token,
        }
    }

    async fn fetch_json(&self, path: &str, params: Vec<(&str, String)>) -> Result<String> {
        let mut query_params = params;
        query_params.push(("token", self.token.clone()));

        let url = reqwest::Url::parse_with_params(&format!("{}{}", BASE_URL, path), &query_params)
            .map_err(|e| MarketDataError::ProviderError(format!("Failed to build URL: {}", e)))?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MarketDataError::ProviderError(format!(
                "Finnhub API error ({}): {}",
                status, error_body
            )));
        }

        Ok(response.text().await?)
    }

    async fn latest_price(&self, asset: &TrackedAsset) -> Result<(String, Decimal)> {
        let params = vec![("symbol", asset.provider_id.clone())];
        let response_text = self.fetch_json("/quote", params).await?;
        let quote: QuoteResponse = serde_json::from_str(&response_text).map_err(|e| {
            MarketDataError::MalformedResponse(format!(
                "Unexpected quote payload for {}: {}",
                asset.symbol, e
            ))
        })?;

        let current = quote.current.ok_or_else(|| {
            MarketDataError::MalformedResponse(format!(
                "Quote for {} is missing the current price field",
                asset.symbol
            ))
        })?;

        Ok((asset.symbol.clone(), current))
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "c")]
    current: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    #[serde(rename = "s")]
    status: Option<String>,
    #[serde(rename = "c")]
    closes: Option<Vec<Decimal>>,
    #[serde(rename = "t")]
    timestamps: Option<Vec<i64>>,
}

#[async_trait]
impl PriceProvider for FinnhubProvider {
    fn name(&self) -> &'static str {
        "FINNHUB"
    }

    fn kind(&self) -> AssetKind {
        AssetKind::Stock
    }

    async fn latest_prices(&self, assets: &[TrackedAsset]) -> Result<HashMap<String, Decimal>> {
        let futures: Vec<_> = assets.iter().map(|asset| self.latest_price(asset)).collect();

        let mut prices = HashMap::new();
        for result in join_all(futures).await {
            let (symbol, price) = result?;
            prices.insert(symbol, price);
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
            ("symbol", asset.provider_id.clone()),
            ("resolution", "D".to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ];
        let response_text = self.fetch_json("/stock/candle", params).await?;
        let candles: CandleResponse = serde_json::from_str(&response_text).map_err(|e| {
            MarketDataError::MalformedResponse(format!(
                "Unexpected candle payload for {}: {}",
                asset.symbol, e
            ))
        })?;

        match candles.status.as_deref() {
            Some("ok") => {}
            Some("no_data") => {
                warn!("Finnhub has no candles for {} in {}..={}", asset.symbol, start, end);
                return Ok(Vec::new());
            }
            other => {
                return Err(MarketDataError::MalformedResponse(format!(
                    "Candle status for {} is {:?}",
                    asset.symbol, other
                )))
            }
        }

        let (closes, timestamps) = match (candles.closes, candles.timestamps) {
            (Some(closes), Some(timestamps)) if closes.len() == timestamps.len() => {
                (closes, timestamps)
            }
            _ => {
                return Err(MarketDataError::MalformedResponse(format!(
                    "Candle payload for {} is missing close or timestamp arrays",
                    asset.symbol
                )))
            }
        };

        Ok(timestamps
            .into_iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                DateTime::from_timestamp(ts, 0).map(|dt| (dt.date_naive(), close))
            })
            .collect())
    }
}
