//! Value codec: database scalars to transport-safe representations.
//!
//! The envelope contract allows only a fixed value set, so everything the
//! store hands back is narrowed here: arbitrary-precision decimals become
//! IEEE doubles, date/time values become ISO-8601 text, and unrecognized
//! types fall back to their text form.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};

use crate::db::types::{Row, SqlValue};

/// Converts an arbitrary-precision decimal to an IEEE double value.
///
/// Precision beyond what an f64 can carry is lost; that is the transport
/// contract, not an accident.
pub fn decimal_value(decimal: Decimal) -> SqlValue {
    match decimal.to_f64() {
        Some(f) => SqlValue::Float(f),
        None => SqlValue::String(decimal.to_string()),
    }
}

/// Renders a calendar date as ISO-8601 text (`YYYY-MM-DD`).
pub fn date_value(date: NaiveDate) -> SqlValue {
    SqlValue::String(date.format("%Y-%m-%d").to_string())
}

/// Renders a time of day as ISO-8601 text.
pub fn time_value(time: NaiveTime) -> SqlValue {
    SqlValue::String(time.format("%H:%M:%S%.f").to_string())
}

/// Renders a timezone-naive timestamp as ISO-8601 text.
pub fn timestamp_value(timestamp: NaiveDateTime) -> SqlValue {
    SqlValue::String(timestamp.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

/// Renders a UTC timestamp as ISO-8601 text with offset.
pub fn timestamptz_value(timestamp: DateTime<Utc>) -> SqlValue {
    SqlValue::String(timestamp.to_rfc3339())
}

/// Converts a sqlx PgRow to an ordered name-to-value Row.
pub fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            (
                col.name().to_string(),
                convert_value(row, i, col.type_info().name()),
            )
        })
        .collect()
}

/// Converts a single column value from a PgRow to a transport-safe value.
///
/// Dispatches on the Postgres type name; anything unrecognized is fetched
/// as text, and an undecodable value degrades to NULL.
pub fn convert_value(row: &PgRow, index: usize, type_name: &str) -> SqlValue {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(SqlValue::Bool)
            .unwrap_or(SqlValue::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| SqlValue::Int(v as i64))
            .unwrap_or(SqlValue::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| SqlValue::Int(v as i64))
            .unwrap_or(SqlValue::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(SqlValue::Int)
            .unwrap_or(SqlValue::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| SqlValue::Float(v as f64))
            .unwrap_or(SqlValue::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(SqlValue::Float)
            .unwrap_or(SqlValue::Null),

        "NUMERIC" | "DECIMAL" => row
            .try_get::<Option<Decimal>, _>(index)
            .ok()
            .flatten()
            .map(decimal_value)
            .unwrap_or(SqlValue::Null),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(date_value)
            .unwrap_or(SqlValue::Null),

        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(time_value)
            .unwrap_or(SqlValue::Null),

        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(timestamp_value)
            .unwrap_or(SqlValue::Null),

        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .ok()
            .flatten()
            .map(timestamptz_value)
            .unwrap_or(SqlValue::Null),

        // For all other types, try to get as text
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(SqlValue::String)
            .unwrap_or(SqlValue::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_decimal_to_double() {
        let value = decimal_value(Decimal::from_str("1234.50").unwrap());
        assert_eq!(value, SqlValue::Float(1234.5));
    }

    #[test]
    fn test_decimal_negative_and_zero() {
        assert_eq!(
            decimal_value(Decimal::from_str("-0.25").unwrap()),
            SqlValue::Float(-0.25)
        );
        assert_eq!(decimal_value(Decimal::ZERO), SqlValue::Float(0.0));
    }

    #[test]
    fn test_date_is_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(date_value(date), SqlValue::String("2024-05-01".into()));
    }

    #[test]
    fn test_timestamp_is_iso() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(13, 30, 5)
            .unwrap();
        assert_eq!(
            timestamp_value(ts),
            SqlValue::String("2024-05-01T13:30:05".into())
        );
    }

    #[test]
    fn test_timestamptz_carries_offset() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T13:30:05+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let SqlValue::String(text) = timestamptz_value(ts) else {
            panic!("expected text value");
        };
        assert!(text.starts_with("2024-05-01T13:30:05"));
        assert!(text.ends_with("+00:00") || text.ends_with('Z'));
        // Stable: parses back to the same instant.
        let parsed = DateTime::parse_from_rfc3339(&text).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), ts);
    }

    #[test]
    fn test_time_is_iso() {
        let time = NaiveTime::from_hms_opt(23, 59, 1).unwrap();
        assert_eq!(time_value(time), SqlValue::String("23:59:01".into()));
    }
}
