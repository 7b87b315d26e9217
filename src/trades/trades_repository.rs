use chrono::NaiveDate;
use diesel::prelude::*;
use std::sync::Arc;

use super::trades_errors::{Result, TradeError};
use super::trades_model::{Trade, TradeDB};
use super::trades_traits::TradeRepositoryTrait;
use crate::constants::DATE_FORMAT;
use crate::db::{get_connection, DbPool};
use crate::schema::trades;

pub struct TradeRepository {
    pool: Arc<DbPool>,
}

impl TradeRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    fn max_or_min_date(&self, ascending: bool) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;

        let query = trades::table.select(trades::date);
        let raw: Option<String> = if ascending {
            query.order(trades::date.asc()).first::<String>(&mut conn).optional()?
        } else {
            query.order(trades::date.desc()).first::<String>(&mut conn).optional()?
        };

        raw.map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map_err(|e| TradeError::InvalidData(format!("Bad stored trade date '{}': {}", s, e)))
        })
        .transpose()
    }
}

impl TradeRepositoryTrait for TradeRepository {
    fn get_all_trades(&self) -> Result<Vec<Trade>> {
        let mut conn = get_connection(&self.pool)?;

        trades::table
            .order((trades::date.asc(), trades::id.asc()))
            .load::<TradeDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Trade::from).collect())
            .map_err(TradeError::Database)
    }

    fn earliest_trade_date(&self) -> Result<Option<NaiveDate>> {
        self.max_or_min_date(true)
    }

    fn latest_trade_date(&self) -> Result<Option<NaiveDate>> {
        self.max_or_min_date(false)
    }

    fn insert_trades(&self, new_trades: &[Trade]) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;

        let mut inserted = 0;
        for chunk in new_trades.chunks(100) {
            let rows: Vec<TradeDB> = chunk.iter().map(TradeDB::from).collect();
            inserted += diesel::insert_or_ignore_into(trades::table)
                .values(&rows)
                .execute(&mut conn)
                .map_err(TradeError::Database)?;
        }

        Ok(inserted)
    }

    fn upsert_trade(&self, trade: &Trade) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        let row = TradeDB::from(trade);
        diesel::replace_into(trades::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(TradeError::Database)?;
        Ok(())
    }

    fn set_excluded(&self, trade_id: &str, excluded: bool) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        let updated = diesel::update(trades::table.filter(trades::id.eq(trade_id)))
            .set(trades::excluded.eq(excluded))
            .execute(&mut conn)
            .map_err(TradeError::Database)?;

        if updated == 0 {
            return Err(TradeError::NotFound(trade_id.to_string()));
        }
        Ok(())
    }
}
