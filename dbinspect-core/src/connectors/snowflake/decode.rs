//! Decoding of SQL API result sets.
//!
//! The SQL API returns every cell as a string (or JSON null) and describes
//! the real type in `resultSetMetaData.rowType`. Cells are converted back to
//! JSON numbers, booleans and ISO-8601 text here.

use crate::models::Row;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use serde::Deserialize;
use serde_json::{Number, Value};

/// Successful statement reply (`200`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    /// Handle for fetching further partitions
    #[serde(default)]
    pub statement_handle: Option<String>,
    /// Column types and partition layout
    #[serde(default)]
    pub result_set_meta_data: Option<ResultSetMetaData>,
    /// First partition, one array of cells per row
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

/// Result-set description returned with the first partition.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetMetaData {
    /// Columns in result order
    #[serde(default)]
    pub row_type: Vec<RowType>,
    /// One entry per partition, the first included
    #[serde(default)]
    pub partition_info: Vec<PartitionInfo>,
}

/// Column description.
#[derive(Debug, Clone, Deserialize)]
pub struct RowType {
    /// Column name, usually upper case
    pub name: String,
    /// Snowflake type family, e.g. `fixed` or `timestamp_ntz`
    #[serde(rename = "type")]
    pub kind: String,
    /// Decimal scale for `fixed`, fractional digits for times
    #[serde(default)]
    pub scale: Option<i64>,
}

/// Size of one result partition.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInfo {
    /// Rows in the partition
    #[serde(default)]
    pub row_count: u64,
}

/// Accepted-but-running reply (`202`), and the shape of error bodies.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementStatus {
    /// Handle to poll
    #[serde(default)]
    pub statement_handle: Option<String>,
    /// Server message
    #[serde(default)]
    pub message: Option<String>,
    /// Snowflake error code
    #[serde(default)]
    pub code: Option<String>,
    /// ANSI SQLSTATE
    #[serde(default)]
    pub sql_state: Option<String>,
}

/// Builds rows from one partition, keys lower-cased.
pub fn decode_rows(row_types: &[RowType], data: &[Vec<Value>]) -> Vec<Row> {
    data.iter()
        .map(|cells| {
            row_types
                .iter()
                .zip(cells)
                .map(|(column, cell)| (column.name.to_lowercase(), decode_cell(column, cell)))
                .collect()
        })
        .collect()
}

/// Converts one string cell according to its column type.
///
/// Unparseable cells are kept as their original text.
pub fn decode_cell(column: &RowType, cell: &Value) -> Value {
    let text = match cell {
        Value::Null => return Value::Null,
        Value::String(text) => text.as_str(),
        other => return other.clone(),
    };

    let decoded = match column.kind.to_ascii_lowercase().as_str() {
        "fixed" => decode_fixed(text, column.scale.unwrap_or(0)),
        "real" => text.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number),
        "boolean" => match text {
            "true" | "1" | "TRUE" => Some(Value::Bool(true)),
            "false" | "0" | "FALSE" => Some(Value::Bool(false)),
            _ => None,
        },
        "date" => decode_date(text),
        "time" => decode_time(text),
        "timestamp_ntz" | "timestamp_ltz" => decode_timestamp(text, None),
        "timestamp_tz" => decode_timestamp_tz(text),
        _ => None,
    };

    decoded.unwrap_or_else(|| Value::String(text.to_string()))
}

fn decode_fixed(text: &str, scale: i64) -> Option<Value> {
    if scale == 0
        && let Ok(int) = text.parse::<i64>()
    {
        return Some(Value::Number(int.into()));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

/// `DATE` cells are days since the Unix epoch.
fn decode_date(text: &str) -> Option<Value> {
    let days = text.parse::<i64>().ok()?;
    let date = NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(TimeDelta::try_days(days)?)?;
    Some(Value::String(date.format("%Y-%m-%d").to_string()))
}

/// `TIME` cells are seconds since midnight with a fraction.
fn decode_time(text: &str) -> Option<Value> {
    let (secs, nanos) = split_epoch(text)?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(u32::try_from(secs).ok()?, nanos)?;
    Some(Value::String(time.format("%H:%M:%S%.f").to_string()))
}

/// `TIMESTAMP_NTZ/LTZ` cells are seconds since the epoch with a fraction.
fn decode_timestamp(text: &str, offset: Option<FixedOffset>) -> Option<Value> {
    let (secs, nanos) = split_epoch(text)?;
    let utc = DateTime::from_timestamp(secs, nanos)?;
    let rendered = match offset {
        Some(offset) => utc
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S%.f %:z")
            .to_string(),
        None => utc.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string(),
    };
    Some(Value::String(rendered))
}

/// `TIMESTAMP_TZ` cells carry a second field: the offset in minutes plus 1440.
fn decode_timestamp_tz(text: &str) -> Option<Value> {
    let (epoch, encoded_offset) = text.split_once(' ')?;
    let minutes = encoded_offset.trim().parse::<i32>().ok()? - 1440;
    let offset = FixedOffset::east_opt(minutes * 60)?;
    decode_timestamp(epoch, Some(offset))
}

/// Splits `"1714557600.123000000"` into whole seconds and nanoseconds,
/// flooring negative values.
fn split_epoch(text: &str) -> Option<(i64, u32)> {
    let text = text.trim();
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    let negative = whole.starts_with('-');
    let mut secs = whole.parse::<i64>().ok()?;

    let digits: String = fraction.chars().take(9).collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut nanos = if digits.is_empty() {
        0
    } else {
        format!("{digits:0<9}").parse::<u32>().ok()?
    };

    if negative && nanos > 0 {
        secs = secs.checked_sub(1)?;
        nanos = 1_000_000_000_u32.saturating_sub(nanos);
    }
    Some((secs, nanos))
}
