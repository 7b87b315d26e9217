/// Default maximum age of the live-price cache before a refresh is attempted.
pub const DEFAULT_LIVE_PRICE_TTL_SECS: i64 = 300;
