//! Value literal codec
//!
//! Turns the string values exchanged with clients into SQL literals, keyed
//! by the column's canonical [`DataType`]. Numeric codecs are strict and fail
//! with [`StudioError::Parse`]; temporal codecs are lenient and fall back to
//! `NULL`.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;

use crate::dialect::SqlDialect;
use crate::error::{Result, StudioError};
use crate::naming;
use crate::types::{ColumnInfo, DataType};

pub const NULL_LITERAL: &str = "NULL";

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

pub fn is_null_literal(literal: &str) -> bool {
    literal.trim().eq_ignore_ascii_case(NULL_LITERAL)
}

/// `lhs = literal`, or `lhs IS NULL` when the literal is `NULL`
pub fn equality_condition(lhs: &str, literal: &str) -> String {
    if is_null_literal(literal) {
        format!("{lhs} IS {NULL_LITERAL}")
    } else {
        format!("{lhs} = {literal}")
    }
}

/// A value wrapped in parentheses is an expression, not data
pub fn is_expression(value: &str) -> bool {
    value.starts_with('(') && value.ends_with(')')
}

/// Literal for a value written to `column`.
///
/// Timestamp columns always get the server's "now" expression and
/// parenthesized values pass through verbatim; everything else goes through
/// [`encode_value`].
pub fn column_literal(
    column: &ColumnInfo,
    value: Option<&str>,
    dialect: &dyn SqlDialect,
) -> Result<String> {
    if naming::is_timestamp(&column.column_name) {
        return Ok(dialect.current_timestamp().to_string());
    }
    if let Some(expression) = value.filter(|v| is_expression(v)) {
        return Ok(expression.to_string());
    }
    encode_value(column.data_type, value, dialect)
}

pub fn encode_value(
    data_type: DataType,
    value: Option<&str>,
    dialect: &dyn SqlDialect,
) -> Result<String> {
    let Some(value) = value else {
        return Ok(NULL_LITERAL.to_string());
    };

    let literal = match data_type {
        DataType::Boolean => encode_boolean(value).to_string(),
        DataType::Integer => encode_integer(value)?,
        DataType::Decimal => encode_decimal(value)?,
        DataType::Float => encode_float(value)?,
        DataType::TimeOnly => lenient(data_type, value, parse_time(value).map(format_time), dialect),
        DataType::DateTime => lenient(
            data_type,
            value,
            parse_datetime(value).map(format_datetime),
            dialect,
        ),
        DataType::DateTimeOffset => lenient(
            data_type,
            value,
            parse_datetime_offset(value).map(format_datetime_offset),
            dialect,
        ),
        DataType::Binary => dialect.binary_literal(value.as_bytes()),
        DataType::String
        | DataType::Char
        | DataType::Json
        | DataType::Xml
        | DataType::Guid
        | DataType::Undefined => dialect.quote_string(value),
    };
    Ok(literal)
}

fn lenient(
    data_type: DataType,
    value: &str,
    rendered: Option<String>,
    dialect: &dyn SqlDialect,
) -> String {
    match rendered {
        Some(text) => dialect.quote_string(&text),
        None => {
            tracing::warn!(%data_type, value, "unparseable temporal value rendered as NULL");
            NULL_LITERAL.to_string()
        }
    }
}

fn encode_boolean(value: &str) -> &'static str {
    if value == "1" || value.eq_ignore_ascii_case("true") {
        "1"
    } else {
        "0"
    }
}

fn encode_integer(value: &str) -> Result<String> {
    value
        .trim()
        .parse::<i64>()
        .map(|n| n.to_string())
        .map_err(|_| StudioError::parse(DataType::Integer, value))
}

fn encode_decimal(value: &str) -> Result<String> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(|d| d.to_string())
        .map_err(|_| StudioError::parse(DataType::Decimal, value))
}

fn encode_float(value: &str) -> Result<String> {
    match value.trim().parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f.to_string()),
        _ => Err(StudioError::parse(DataType::Float, value)),
    }
}

pub(crate) fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Offset-less input is taken as UTC
pub(crate) fn parse_datetime_offset(value: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(trimmed, fmt).ok())
        })
        .or_else(|| parse_datetime(trimmed).map(|naive| naive.and_utc().fixed_offset()))
}

/// Fraction of a second in 100ns ticks, trailing zeros trimmed; empty when zero
fn fraction(nanos: u32) -> String {
    let ticks = nanos.min(999_999_999) / 100;
    if ticks == 0 {
        return String::new();
    }
    let digits = format!("{ticks:07}");
    format!(".{}", digits.trim_end_matches('0'))
}

fn format_time(time: NaiveTime) -> String {
    format!("{}{}", time.format("%H:%M:%S"), fraction(time.nanosecond()))
}

fn format_datetime(dt: NaiveDateTime) -> String {
    format!(
        "{}{}",
        dt.format("%Y-%m-%dT%H:%M:%S"),
        fraction(dt.nanosecond())
    )
}

fn format_datetime_offset(dt: DateTime<FixedOffset>) -> String {
    format!(
        "{}{}{}",
        dt.format("%Y-%m-%dT%H:%M:%S"),
        fraction(dt.nanosecond()),
        dt.format("%:z")
    )
}
