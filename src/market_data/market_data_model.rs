use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{DATE_FORMAT, TIMESTAMP_FORMAT};

/// One daily close observation for an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub asset: String,
    pub date: NaiveDate,
    pub price: Decimal,
}

/// Database model for historical prices. Keyed by `(asset, date)`.
#[derive(Queryable, QueryableByName, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::historical_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PricePointDB {
    pub asset: String,
    pub date: String,
    pub price: String,
}

impl From<PricePointDB> for PricePoint {
    fn from(db: PricePointDB) -> Self {
        PricePoint {
            date: NaiveDate::parse_from_str(&db.date, DATE_FORMAT).unwrap_or_else(|e| {
                log::error!("Failed to parse price date '{}' for {}: {}", db.date, db.asset, e);
                NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
            }),
            price: Decimal::from_str(&db.price).unwrap_or_else(|e| {
                log::error!("Failed to parse price '{}' for {}: {}", db.price, db.asset, e);
                Decimal::ZERO
            }),
            asset: db.asset,
        }
    }
}

impl From<&PricePoint> for PricePointDB {
    fn from(point: &PricePoint) -> Self {
        PricePointDB {
            asset: point.asset.clone(),
            date: point.date.format(DATE_FORMAT).to_string(),
            price: point.price.to_string(),
        }
    }
}

/// The cached current price of one asset. All rows in the cache share a
/// single fetch timestamp because the cache is only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePrice {
    pub asset: String,
    pub price: Decimal,
    pub fetched_at: NaiveDateTime,
}

#[derive(Queryable, QueryableByName, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::live_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LivePriceDB {
    pub asset: String,
    pub price: String,
    pub fetched_at: String,
}

impl From<LivePriceDB> for LivePrice {
    fn from(db: LivePriceDB) -> Self {
        LivePrice {
            price: Decimal::from_str(&db.price).unwrap_or_else(|e| {
                log::error!("Failed to parse live price '{}' for {}: {}", db.price, db.asset, e);
                Decimal::ZERO
            }),
            fetched_at: NaiveDateTime::parse_from_str(&db.fetched_at, TIMESTAMP_FORMAT)
                .unwrap_or_else(|e| {
                    log::error!(
                        "Failed to parse fetch timestamp '{}' for {}: {}",
                        db.fetched_at,
                        db.asset,
                        e
                    );
                    NaiveDateTime::default()
                }),
            asset: db.asset,
        }
    }
}

impl From<&LivePrice> for LivePriceDB {
    fn from(live: &LivePrice) -> Self {
        LivePriceDB {
            asset: live.asset.clone(),
            price: live.price.to_string(),
            fetched_at: live.fetched_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}
