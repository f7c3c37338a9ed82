/// Quantity threshold below which a balance is treated as zero.
/// Absorbs dust left behind by proportional lot relief.
pub const QUANTITY_THRESHOLD: &str = "0.000001";

/// Decimal precision for stored monetary values
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Minimum number of cached quotes for a symbol before the price
/// preload falls through to a full external history fetch.
pub const MIN_CACHED_QUOTES: usize = 5;

/// Days between a dividend ex-date and its assumed payment date when
/// the event carries no explicit payment date.
pub const DEFAULT_PAYMENT_LAG_DAYS: i64 = 15;
