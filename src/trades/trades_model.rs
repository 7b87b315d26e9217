use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

use crate::constants::DATE_FORMAT;
use crate::trades::trades_errors::TradeError;

/// Trade action: Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

impl FromStr for TradeAction {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TradeAction::Buy),
            "SELL" => Ok(TradeAction::Sell),
            other => Err(TradeError::InvalidData(format!(
                "Unknown trade action '{}'",
                other
            ))),
        }
    }
}

/// Domain model for a single execution in the trade ledger.
///
/// `cost` and `value` are both stored rather than re-derived: fee conventions
/// differ by platform, so total consideration cannot be reconstructed from
/// `price * quantity` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub platform: String,
    pub date: NaiveDate,
    pub action: TradeAction,
    pub asset: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fees: Decimal,
    pub cost: Decimal,
    pub value: Decimal,
    pub excluded: bool,
}

impl Trade {
    pub fn validate(&self) -> Result<(), TradeError> {
        if self.id.trim().is_empty() {
            return Err(TradeError::InvalidData("Trade id cannot be empty".to_string()));
        }
        if self.asset.trim().is_empty() {
            return Err(TradeError::InvalidData("Asset cannot be empty".to_string()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(TradeError::InvalidData(format!(
                "Trade {} has non-positive quantity {}",
                self.id, self.quantity
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(TradeError::InvalidData(format!(
                "Trade {} has non-positive price {}",
                self.id, self.price
            )));
        }
        Ok(())
    }
}

/// Computes a stable id for platforms that do not expose an order id.
///
/// The id is a platform prefix plus a truncated SHA-256 over the execution's
/// semantic content, so re-fetching the same fill always yields the same key.
pub fn deterministic_trade_id(
    platform: &str,
    asset: &str,
    date: NaiveDate,
    action: TradeAction,
    quantity: Decimal,
    price: Decimal,
    cost: Decimal,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(asset.as_bytes());
    hasher.update(b"|");
    hasher.update(date.format(DATE_FORMAT).to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(action.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(quantity.normalize().to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(price.normalize().to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(cost.normalize().to_string().as_bytes());

    let digest = hex::encode(hasher.finalize());
    format!("{}-{}", platform, &digest[..20])
}

/// Database model for trades. Decimals and dates are stored as TEXT.
#[derive(Queryable, QueryableByName, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeDB {
    pub id: String,
    pub platform: String,
    pub date: String,
    pub action: String,
    pub asset: String,
    pub price: String,
    pub quantity: String,
    pub fees: String,
    pub cost: String,
    pub value: String,
    pub excluded: bool,
}

fn parse_decimal(raw: &str, field: &str, id: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_else(|e| {
        log::error!("Failed to parse {} '{}' for trade {}: {}", field, raw, id, e);
        Decimal::ZERO
    })
}

impl From<TradeDB> for Trade {
    fn from(db: TradeDB) -> Self {
        Trade {
            platform: db.platform,
            date: NaiveDate::parse_from_str(&db.date, DATE_FORMAT).unwrap_or_else(|e| {
                log::error!("Failed to parse date '{}' for trade {}: {}", db.date, db.id, e);
                NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
            }),
            action: TradeAction::from_str(&db.action).unwrap_or_else(|e| {
                log::error!("{}", e);
                TradeAction::Buy
            }),
            asset: db.asset,
            price: parse_decimal(&db.price, "price", &db.id),
            quantity: parse_decimal(&db.quantity, "quantity", &db.id),
            fees: parse_decimal(&db.fees, "fees", &db.id),
            cost: parse_decimal(&db.cost, "cost", &db.id),
            value: parse_decimal(&db.value, "value", &db.id),
            excluded: db.excluded,
            id: db.id,
        }
    }
}

impl From<&Trade> for TradeDB {
    fn from(trade: &Trade) -> Self {
        TradeDB {
            id: trade.id.clone(),
            platform: trade.platform.clone(),
            date: trade.date.format(DATE_FORMAT).to_string(),
            action: trade.action.as_str().to_string(),
            asset: trade.asset.clone(),
            price: trade.price.to_string(),
            quantity: trade.quantity.to_string(),
            fees: trade.fees.to_string(),
            cost: trade.cost.to_string(),
            value: trade.value.to_string(),
            excluded: trade.excluded,
        }
    }
}
