//! Helpers shared by the repository modules.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Maximum number of rows per batched INSERT.
///
/// SQLite has a compile-time limit on the number of bound parameters per
/// statement. 500 rows keeps every batch comfortably under it for all of
/// our tables.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into batches for multi-row statements.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Parses a stored decimal, falling back through f64 for values written in
/// scientific notation. Unparseable values are logged and read as zero so
/// one damaged row does not take the whole query down.
pub fn parse_decimal(value_str: &str, field_name: &str) -> Decimal {
    match Decimal::from_str(value_str) {
        Ok(d) => d,
        Err(e_decimal) => match f64::from_str(value_str).ok().and_then(Decimal::from_f64) {
            Some(dec_val) => dec_val,
            None => {
                log::error!(
                    "Failed to parse {} '{}' as Decimal: {}. Falling back to ZERO.",
                    field_name,
                    value_str,
                    e_decimal
                );
                Decimal::ZERO
            }
        },
    }
}

/// Parses a stored `%Y-%m-%d` date. Unparseable values are logged and read
/// as the epoch date.
pub fn parse_date(value_str: &str, field_name: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value_str, "%Y-%m-%d").unwrap_or_else(|e| {
        log::error!("Failed to parse {} '{}': {}", field_name, value_str, e);
        NaiveDate::default()
    })
}

/// Parses a stored `%Y-%m-%dT%H:%M:%S%.f` timestamp.
pub fn parse_datetime(value_str: &str, field_name: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value_str, "%Y-%m-%dT%H:%M:%S%.f").unwrap_or_else(|e| {
        log::error!("Failed to parse {} '{}': {}", field_name, value_str, e);
        NaiveDateTime::default()
    })
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}
