use log::{info, warn};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use super::trades_constants::DUPLICATE_RELATIVE_TOLERANCE;
use super::trades_model::Trade;
use super::trades_traits::{TradeRepositoryTrait, TradeSource};
use crate::errors::Result;

/// Owns the trade ledger's write path: merging freshly scraped executions
/// into the stored history and the two permitted corrections (excluded flag,
/// corrected-value upsert).
pub struct TradeService {
    repository: Arc<dyn TradeRepositoryTrait>,
}

impl TradeService {
    pub fn new(repository: Arc<dyn TradeRepositoryTrait>) -> Self {
        Self { repository }
    }

    pub fn get_all_trades(&self) -> Result<Vec<Trade>> {
        Ok(self.repository.get_all_trades()?)
    }

    /// Merges executions fetched from `source` on or after `since` into the
    /// ledger. `since` is the caller-owned sync watermark; the engine keeps
    /// no global last-sync state.
    ///
    /// Incoming trades whose id is already stored are ignored. An incoming
    /// trade with a new id that matches a stored same-day trade on asset and
    /// action, with price and quantity both within 0.01% relative difference,
    /// is treated as a re-fetched duplicate whose id drifted and is skipped.
    /// This is a best-effort heuristic, not a guaranteed dedup.
    pub async fn sync_trades(&self, source: &dyn TradeSource, since: NaiveDate) -> Result<usize> {
        info!("Checking for recent {} trades since {}", source.platform(), since);
        let incoming = source.fetch_trades(since).await?;
        if incoming.is_empty() {
            info!("No new {} trades found", source.platform());
            return Ok(0);
        }

        let existing = self.repository.get_all_trades()?;
        let existing_ids: HashSet<&str> = existing.iter().map(|t| t.id.as_str()).collect();

        let mut fresh = Vec::new();
        for trade in incoming {
            trade.validate()?;
            if existing_ids.contains(trade.id.as_str()) {
                continue;
            }
            if let Some(stored) = existing.iter().find(|e| is_refetched_duplicate(e, &trade)) {
                warn!(
                    "Skipping {} trade {}: within duplicate tolerance of stored trade {}",
                    source.platform(),
                    trade.id,
                    stored.id
                );
                continue;
            }
            fresh.push(trade);
        }

        if fresh.is_empty() {
            info!("No new {} trades found", source.platform());
            return Ok(0);
        }

        let inserted = self.repository.insert_trades(&fresh)?;
        info!("Stored {} new {} trades", inserted, source.platform());
        Ok(inserted)
    }

    /// Replaces a stored trade with corrected values under the same id.
    pub fn upsert_trade(&self, trade: &Trade) -> Result<()> {
        trade.validate()?;
        Ok(self.repository.upsert_trade(trade)?)
    }

    /// Toggles a trade out of (or back into) position math without deleting
    /// its history.
    pub fn set_trade_excluded(&self, trade_id: &str, excluded: bool) -> Result<()> {
        Ok(self.repository.set_excluded(trade_id, excluded)?)
    }
}

fn is_refetched_duplicate(stored: &Trade, incoming: &Trade) -> bool {
    stored.asset == incoming.asset
        && stored.date == incoming.date
        && stored.action == incoming.action
        && within_tolerance(stored.price, incoming.price)
        && within_tolerance(stored.quantity, incoming.quantity)
}

fn within_tolerance(stored: Decimal, incoming: Decimal) -> bool {
    if stored.is_zero() {
        return incoming.is_zero();
    }
    ((stored - incoming) / stored).abs() <= DUPLICATE_RELATIVE_TOLERANCE
}
