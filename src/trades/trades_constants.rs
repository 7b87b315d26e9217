use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Relative tolerance (0.01%) under which a re-fetched trade with a shifted
/// id is considered the same execution as one already stored. Best-effort
/// heuristic: platforms re-serve filled orders with drifting rounding.
pub const DUPLICATE_RELATIVE_TOLERANCE: Decimal = dec!(0.0001);
