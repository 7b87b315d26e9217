use chrono::NaiveDate;
use diesel::prelude::*;
use std::sync::Arc;

use super::portfolio_errors::{PortfolioError, Result};
use super::portfolio_traits::SnapshotRepositoryTrait;
use super::positions_model::{
    HistoricalPosition, HistoricalPositionDB, Position, PositionDB,
};
use crate::constants::DATE_FORMAT;
use crate::db::{get_connection, DbPool};
use crate::schema::{historical_positions, positions};

pub struct SnapshotRepository {
    pool: Arc<DbPool>,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl SnapshotRepositoryTrait for SnapshotRepository {
    fn get_all_positions(&self) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)?;

        positions::table
            .order(positions::asset.asc())
            .load::<PositionDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Position::from).collect())
            .map_err(PortfolioError::Database)
    }

    fn replace_positions(&self, new_positions: &[Position]) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<PositionDB> = new_positions.iter().map(PositionDB::from).collect();
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(positions::table).execute(conn)?;
            diesel::insert_into(positions::table)
                .values(&rows)
                .execute(conn)?;
            Ok(())
        })
        .map_err(PortfolioError::Database)?;

        Ok(())
    }

    fn latest_snapshot_date(&self) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;

        let raw: Option<String> = historical_positions::table
            .select(diesel::dsl::max(historical_positions::date))
            .first::<Option<String>>(&mut conn)
            .map_err(PortfolioError::Database)?;

        raw.map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
                PortfolioError::InvalidData(format!("Bad stored snapshot date '{}': {}", s, e))
            })
        })
        .transpose()
    }

    fn insert_historical_positions(&self, new_rows: &[HistoricalPosition]) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;

        let mut inserted = 0;
        for chunk in new_rows.chunks(100) {
            let rows: Vec<HistoricalPositionDB> =
                chunk.iter().map(HistoricalPositionDB::from).collect();
            inserted += diesel::insert_or_ignore_into(historical_positions::table)
                .values(&rows)
                .execute(&mut conn)
                .map_err(PortfolioError::Database)?;
        }

        Ok(inserted)
    }

    fn get_historical_positions(
        &self,
        start_date: Option<NaiveDate>,
        assets: &[String],
    ) -> Result<Vec<HistoricalPosition>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = historical_positions::table.into_boxed();
        if let Some(start) = start_date {
            query = query.filter(
                historical_positions::date.ge(start.format(DATE_FORMAT).to_string()),
            );
        }
        if !assets.is_empty() {
            query = query.filter(historical_positions::asset.eq_any(assets));
        }

        query
            .order((historical_positions::date.asc(), historical_positions::asset.asc()))
            .load::<HistoricalPositionDB>(&mut conn)
            .map(|rows| rows.into_iter().map(HistoricalPosition::from).collect())
            .map_err(PortfolioError::Database)
    }
}
