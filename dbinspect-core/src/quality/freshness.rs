//! Freshness scoring from the newest value of a temporal column.

use crate::connectors::DatabaseConnector;
use crate::connectors::helpers::RowExt;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

/// Score when the column holds no values.
pub const EMPTY_COLUMN_SCORE: f64 = 50.0;

/// Score when the newest value cannot be read or parsed.
pub const UNKNOWN_AGE_SCORE: f64 = 75.0;

/// Age bands in whole days and their scores, youngest first.
const AGE_BANDS: [(i64, f64); 6] = [
    (1, 100.0),
    (7, 90.0),
    (30, 80.0),
    (90, 65.0),
    (180, 50.0),
    (365, 35.0),
];

const OLDEST_SCORE: f64 = 20.0;

/// Parses the first 19 characters of a timestamp in one of the accepted
/// layouts. Dates parse as midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let head: String = text.trim().chars().take(19).collect();

    NaiveDateTime::parse_from_str(&head, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(&head, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .or_else(|| NaiveDateTime::parse_from_str(&head, "%Y-%m-%dT%H:%M:%S").ok())
}

/// Score for data whose newest row is `age_days` old.
pub fn score_for_age(age_days: i64) -> f64 {
    AGE_BANDS
        .iter()
        .find(|(max_days, _)| age_days <= *max_days)
        .map_or(OLDEST_SCORE, |(_, score)| *score)
}

/// Freshness of `latest` relative to `now` (both UTC).
///
/// `None` means the column is empty or entirely NULL.
pub fn freshness_score_at(latest: Option<&str>, now: NaiveDateTime) -> f64 {
    let Some(latest) = latest else {
        return EMPTY_COLUMN_SCORE;
    };
    match parse_timestamp(latest) {
        Some(timestamp) => score_for_age((now - timestamp).num_days()),
        None => UNKNOWN_AGE_SCORE,
    }
}

/// Queries the newest value of `column` and scores it against the current
/// UTC time. Query failures score [`UNKNOWN_AGE_SCORE`].
pub async fn freshness_score<C>(
    connector: &C,
    table: &str,
    column: &str,
    schema: Option<&str>,
) -> f64
where
    C: DatabaseConnector + ?Sized,
{
    let sql = format!(
        "SELECT MAX({}) AS latest FROM {}",
        connector.quote_identifier(column),
        connector.qualified_table(table, schema)
    );

    match connector.execute(&sql, &[]).await {
        Ok(rows) => {
            let latest = rows.first().and_then(|row| row.get_string("latest"));
            freshness_score_at(latest.as_deref(), chrono::Utc::now().naive_utc())
        }
        Err(e) => {
            debug!("Freshness of {}.{} unknown: {}", table, column, e);
            UNKNOWN_AGE_SCORE
        }
    }
}
