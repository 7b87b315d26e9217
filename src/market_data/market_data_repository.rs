use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::market_data_errors::{MarketDataError, Result};
use super::market_data_model::{LivePrice, LivePriceDB, PricePoint, PricePointDB};
use super::market_data_traits::MarketDataRepositoryTrait;
use crate::constants::DATE_FORMAT;
use crate::db::{get_connection, DbPool};
use crate::schema::{historical_prices, live_prices};

pub struct MarketDataRepository {
    pool: Arc<DbPool>,
}

impl MarketDataRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl MarketDataRepositoryTrait for MarketDataRepository {
    fn get_historical_prices(&self) -> Result<Vec<PricePoint>> {
        let mut conn = get_connection(&self.pool)?;

        historical_prices::table
            .order((historical_prices::asset.asc(), historical_prices::date.asc()))
            .load::<PricePointDB>(&mut conn)
            .map(|rows| rows.into_iter().map(PricePoint::from).collect())
            .map_err(MarketDataError::Database)
    }

    fn get_latest_historical_prices(&self) -> Result<Vec<PricePoint>> {
        let mut conn = get_connection(&self.pool)?;

        // Latest stored row per asset; ISO dates compare correctly as text.
        diesel::sql_query(
            "WITH latest AS (
                SELECT asset, MAX(date) AS max_date
                FROM historical_prices
                GROUP BY asset
            )
            SELECT p.asset, p.date, p.price
            FROM historical_prices p
            INNER JOIN latest l
                ON p.asset = l.asset
                AND p.date = l.max_date",
        )
        .load::<PricePointDB>(&mut conn)
        .map(|rows| rows.into_iter().map(PricePoint::from).collect())
        .map_err(MarketDataError::Database)
    }

    fn latest_price_date(&self) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;

        let raw: Option<String> = historical_prices::table
            .select(diesel::dsl::max(historical_prices::date))
            .first::<Option<String>>(&mut conn)
            .map_err(MarketDataError::Database)?;

        raw.map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
                MarketDataError::InvalidData(format!("Bad stored price date '{}': {}", s, e))
            })
        })
        .transpose()
    }

    fn insert_historical_prices(&self, points: &[PricePoint]) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;

        let mut inserted = 0;
        for chunk in points.chunks(100) {
            let rows: Vec<PricePointDB> = chunk.iter().map(PricePointDB::from).collect();
            inserted += diesel::insert_or_ignore_into(historical_prices::table)
                .values(&rows)
                .execute(&mut conn)
                .map_err(MarketDataError::Database)?;
        }

        Ok(inserted)
    }

    fn get_live_prices(&self) -> Result<Vec<LivePrice>> {
        let mut conn = get_connection(&self.pool)?;

        live_prices::table
            .order(live_prices::asset.asc())
            .load::<LivePriceDB>(&mut conn)
            .map(|rows| rows.into_iter().map(LivePrice::from).collect())
            .map_err(MarketDataError::Database)
    }

    fn replace_live_prices(
        &self,
        prices: &HashMap<String, Decimal>,
        fetched_at: NaiveDateTime,
    ) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<LivePriceDB> = prices
            .iter()
            .map(|(asset, price)| {
                LivePriceDB::from(&LivePrice {
                    asset: asset.clone(),
                    price: *price,
                    fetched_at,
                })
            })
            .collect();

        // Delete-all plus bulk insert under one transaction: readers see
        // either the old cache or the new one, never a mix.
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(live_prices::table).execute(conn)?;
            diesel::insert_into(live_prices::table)
                .values(&rows)
                .execute(conn)?;
            Ok(())
        })
        .map_err(MarketDataError::Database)?;

        Ok(())
    }
}
