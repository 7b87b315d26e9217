use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::DATE_FORMAT;

/// A single unconsumed buy's remaining quantity and execution price,
/// tracked for FIFO cost-basis matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub quantity: Decimal,
    pub price: Decimal,
}

impl Lot {
    pub fn cost(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// The open position in one asset after FIFO netting of its trade history.
/// Derived data: fully recomputed on each build, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub asset: String,
    pub average_price: Decimal,
    pub quantity: Decimal,
    pub cost: Decimal,
}

#[derive(Queryable, QueryableByName, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionDB {
    pub asset: String,
    pub average_price: String,
    pub quantity: String,
    pub cost: String,
}

fn parse_decimal(raw: &str, field: &str, asset: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_else(|e| {
        log::error!("Failed to parse {} '{}' for {}: {}", field, raw, asset, e);
        Decimal::ZERO
    })
}

impl From<PositionDB> for Position {
    fn from(db: PositionDB) -> Self {
        Position {
            average_price: parse_decimal(&db.average_price, "average_price", &db.asset),
            quantity: parse_decimal(&db.quantity, "quantity", &db.asset),
            cost: parse_decimal(&db.cost, "cost", &db.asset),
            asset: db.asset,
        }
    }
}

impl From<&Position> for PositionDB {
    fn from(position: &Position) -> Self {
        PositionDB {
            asset: position.asset.clone(),
            average_price: position.average_price.to_string(),
            quantity: position.quantity.to_string(),
            cost: position.cost.to_string(),
        }
    }
}

/// One asset's portfolio state as of the close of a specific day.
/// Append-only audit trail; rows are never recomputed in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPosition {
    pub asset: String,
    pub date: NaiveDate,
    pub average_position_price: Decimal,
    pub daily_close_price: Decimal,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub value: Decimal,
    pub returns: Decimal,
}

impl HistoricalPosition {
    /// The deterministic row for an asset whose position was fully closed
    /// by `date`: all figures zero, so the audit trail stays complete.
    pub fn closed(asset: &str, date: NaiveDate) -> Self {
        HistoricalPosition {
            asset: asset.to_string(),
            date,
            average_position_price: Decimal::ZERO,
            daily_close_price: Decimal::ZERO,
            quantity: Decimal::ZERO,
            cost: Decimal::ZERO,
            value: Decimal::ZERO,
            returns: Decimal::ZERO,
        }
    }
}

#[derive(Queryable, QueryableByName, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::historical_positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HistoricalPositionDB {
    pub asset: String,
    pub date: String,
    pub average_position_price: String,
    pub daily_close_price: String,
    pub quantity: String,
    pub cost: String,
    pub value: String,
    pub returns: String,
}

impl From<HistoricalPositionDB> for HistoricalPosition {
    fn from(db: HistoricalPositionDB) -> Self {
        HistoricalPosition {
            date: NaiveDate::parse_from_str(&db.date, DATE_FORMAT).unwrap_or_else(|e| {
                log::error!("Failed to parse snapshot date '{}' for {}: {}", db.date, db.asset, e);
                NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
            }),
            average_position_price: parse_decimal(
                &db.average_position_price,
                "average_position_price",
                &db.asset,
            ),
            daily_close_price: parse_decimal(&db.daily_close_price, "daily_close_price", &db.asset),
            quantity: parse_decimal(&db.quantity, "quantity", &db.asset),
            cost: parse_decimal(&db.cost, "cost", &db.asset),
            value: parse_decimal(&db.value, "value", &db.asset),
            returns: parse_decimal(&db.returns, "returns", &db.asset),
            asset: db.asset,
        }
    }
}

impl From<&HistoricalPosition> for HistoricalPositionDB {
    fn from(row: &HistoricalPosition) -> Self {
        HistoricalPositionDB {
            asset: row.asset.clone(),
            date: row.date.format(DATE_FORMAT).to_string(),
            average_position_price: row.average_position_price.to_string(),
            daily_close_price: row.daily_close_price.to_string(),
            quantity: row.quantity.to_string(),
            cost: row.cost.to_string(),
            value: row.value.to_string(),
            returns: row.returns.to_string(),
        }
    }
}

/// A current position joined with its live price and registry metadata,
/// ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPosition {
    pub asset: String,
    pub market: String,
    pub segment: String,
    pub description: String,
    pub current_price: Decimal,
    pub average_price: Decimal,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub value: Decimal,
    pub returns: Decimal,
    pub current_allocation: Decimal,
    pub target_allocation: Decimal,
}

/// Portfolio-level cost, value and return for one historical date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub cost: Decimal,
    pub value: Decimal,
    pub returns: Decimal,
}
