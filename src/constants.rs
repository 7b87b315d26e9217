/// Storage format for calendar days (dates are persisted as TEXT).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage format for timestamps (persisted as TEXT, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
