//! Forward-fill for sparse daily price series.
//!
//! Close prices only exist for trading days; valuation needs one price per
//! calendar day. Each asset's series is densified from its earliest known
//! date to a shared end date by carrying the last known price forward.

use chrono::{Days, NaiveDate};
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::market_data_errors::{MarketDataError, Result};
use super::market_data_model::PricePoint;

/// Densifies a sparse per-asset price series over calendar days.
///
/// Assets with no points at all contribute nothing to the output; no price
/// is ever fabricated. The output covers, per asset, every day from that
/// asset's earliest point through `end_date`.
pub fn fill_forward(points: &[PricePoint], end_date: NaiveDate) -> Result<Vec<PricePoint>> {
    let mut by_asset: BTreeMap<&str, BTreeMap<NaiveDate, Decimal>> = BTreeMap::new();
    for point in points {
        by_asset
            .entry(point.asset.as_str())
            .or_default()
            .insert(point.date, point.price);
    }

    let mut filled = Vec::new();
    for (asset, series) in by_asset {
        // First key of the BTreeMap is the asset's earliest known date.
        let start = match series.keys().next() {
            Some(date) => *date,
            None => continue,
        };
        filled.extend(fill_asset(asset, &series, start, end_date)?);
    }

    Ok(filled)
}

/// Linear scan over `[start, end]`, carrying the last seen price into days
/// with no observation. A day before the first observation has nothing to
/// carry and is an error, never a silent zero.
fn fill_asset(
    asset: &str,
    series: &BTreeMap<NaiveDate, Decimal>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PricePoint>> {
    let mut filled = Vec::new();
    let mut last_price: Option<Decimal> = None;
    let mut date = start;

    while date <= end {
        let price = match series.get(&date) {
            Some(price) => {
                last_price = Some(*price);
                *price
            }
            None => last_price.ok_or_else(|| MarketDataError::MissingLeadingPrice {
                asset: asset.to_string(),
                date,
            })?,
        };

        filled.push(PricePoint {
            asset: asset.to_string(),
            date,
            price,
        });
        date = date + Days::new(1);
    }

    debug!(
        "Forward-filled {} to {} rows over {}..={}",
        asset,
        filled.len(),
        start,
        end
    );
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn point(asset: &str, date: NaiveDate, price: Decimal) -> PricePoint {
        PricePoint {
            asset: asset.to_string(),
            date,
            price,
        }
    }

    #[test]
    fn gap_is_filled_with_last_known_price_only() {
        // Known on day 1 and day 5; days 2-4 must carry the day-1 price and
        // the day-5 price must not leak backwards.
        let points = vec![
            point("BTC", day(1), dec!(100)),
            point("BTC", day(5), dec!(140)),
        ];

        let filled = fill_forward(&points, day(5)).unwrap();
        assert_eq!(filled.len(), 5);
        for row in &filled[..4] {
            assert_eq!(row.price, dec!(100));
        }
        assert_eq!(filled[4].date, day(5));
        assert_eq!(filled[4].price, dec!(140));
    }

    #[test]
    fn trailing_gap_extends_to_the_shared_end_date() {
        let points = vec![point("ETH", day(3), dec!(50))];

        let filled = fill_forward(&points, day(6)).unwrap();
        let dates: Vec<NaiveDate> = filled.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(3), day(4), day(5), day(6)]);
        assert!(filled.iter().all(|p| p.price == dec!(50)));
    }

    #[test]
    fn each_asset_ranges_from_its_own_earliest_date() {
        let points = vec![
            point("BTC", day(1), dec!(100)),
            point("ETH", day(4), dec!(50)),
        ];

        let filled = fill_forward(&points, day(5)).unwrap();
        let btc: Vec<&PricePoint> = filled.iter().filter(|p| p.asset == "BTC").collect();
        let eth: Vec<&PricePoint> = filled.iter().filter(|p| p.asset == "ETH").collect();
        assert_eq!(btc.len(), 5);
        assert_eq!(eth.len(), 2);
        assert_eq!(eth[0].date, day(4));
    }

    #[test]
    fn empty_input_produces_no_rows() {
        let filled = fill_forward(&[], day(5)).unwrap();
        assert!(filled.is_empty());
    }

    #[test]
    fn leading_gap_fails_loudly() {
        let mut series = BTreeMap::new();
        series.insert(day(3), dec!(10));

        let err = fill_asset("BTC", &series, day(1), day(5)).unwrap_err();
        match err {
            MarketDataError::MissingLeadingPrice { asset, date } => {
                assert_eq!(asset, "BTC");
                assert_eq!(date, day(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn refilling_known_days_is_a_no_op_change() {
        // Dense input round-trips unchanged, which keeps repeated backfill
        // runs idempotent once paired with insert-or-ignore persistence.
        let points = vec![
            point("BTC", day(1), dec!(100)),
            point("BTC", day(2), dec!(101)),
            point("BTC", day(3), dec!(102)),
        ];

        let filled = fill_forward(&points, day(3)).unwrap();
        assert_eq!(filled, points);
    }
}
