//! FIFO lot-matching position construction from the trade ledger.

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};

use super::positions_model::{Lot, Position};
use crate::assets::AssetRegistry;
use crate::trades::{Trade, TradeAction};

/// Computes the open position per asset from the trade history up to and
/// including `as_of_date`.
///
/// Trades dated after the cutoff, trades flagged `excluded`, and trades in
/// assets outside the registry are skipped. An asset whose buys and sells
/// net to exactly zero contributes no row.
pub fn build_positions(
    trades: &[Trade],
    as_of_date: NaiveDate,
    registry: &AssetRegistry,
) -> Vec<Position> {
    let mut by_asset: BTreeMap<&str, Vec<&Trade>> = BTreeMap::new();
    for trade in trades {
        if trade.excluded || trade.date > as_of_date || !registry.contains(&trade.asset) {
            continue;
        }
        by_asset.entry(trade.asset.as_str()).or_default().push(trade);
    }

    let mut positions = Vec::new();
    for (asset, mut asset_trades) in by_asset {
        // Stable sort: same-day trades keep their ledger order.
        asset_trades.sort_by_key(|trade| trade.date);

        let lots = match_lots_fifo(asset, &asset_trades);
        let quantity: Decimal = lots.iter().map(|lot| lot.quantity).sum();
        if quantity.is_zero() {
            continue;
        }

        let cost: Decimal = lots.iter().map(Lot::cost).sum();
        positions.push(Position {
            asset: asset.to_string(),
            average_price: cost / quantity,
            quantity,
            cost,
        });
    }

    positions
}

/// Walks one asset's trades in date order, maintaining the queue of open
/// buy lots. Sells consume from the head (oldest lot first); a partially
/// consumed lot is decremented in place.
///
/// A sell larger than the cumulative open lots empties the queue and the
/// remainder is dropped with a warning: short positions are not tracked,
/// and the ledger is not validated against over-selling here.
fn match_lots_fifo(asset: &str, trades: &[&Trade]) -> VecDeque<Lot> {
    let mut lots: VecDeque<Lot> = VecDeque::new();

    for trade in trades {
        match trade.action {
            TradeAction::Buy => lots.push_back(Lot {
                quantity: trade.quantity,
                price: trade.price,
            }),
            TradeAction::Sell => {
                let mut remaining = trade.quantity;
                while remaining > Decimal::ZERO {
                    let Some(oldest) = lots.front_mut() else {
                        warn!(
                            "Sell of {} {} on {} exceeds open lots; {} left unmatched",
                            trade.quantity, asset, trade.date, remaining
                        );
                        break;
                    };

                    if oldest.quantity > remaining {
                        oldest.quantity -= remaining;
                        remaining = Decimal::ZERO;
                    } else {
                        remaining -= oldest.quantity;
                        lots.pop_front();
                    }
                }
            }
        }
    }

    lots
}
