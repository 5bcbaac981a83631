//! Backend-agnostic column statistics.
//!
//! The engine is written once against [`DatabaseConnector`] and uses only
//! `execute` with portable aggregate SQL. Identifiers always go through the
//! connector's quoting policy. Every step is best-effort: a failure stops the
//! remaining steps, keeps what was already computed and is recorded in
//! [`ColumnStats::error`] instead of being returned.
//!
//! # Module Structure
//! - `classifier`: numeric/temporal type classification
//! - `models`: `ColumnStats` and `TopValue`

mod classifier;
mod models;

pub use classifier::{
    HeuristicClassifier, NUMERIC_TYPE_HINTS, TEMPORAL_TYPE_HINTS, TypeCategory, TypeClassifier,
};
pub use models::{ColumnStats, TopValue};

pub(crate) use models::{percentage, round_to};

use crate::Result;
use crate::connectors::DatabaseConnector;
use crate::connectors::helpers::RowExt;
use crate::error::DbInspectError;
use tracing::{debug, warn};

/// Top values are only collected at or below this many distinct values.
pub const TOP_VALUES_MAX_DISTINCT: u64 = 50;

/// Number of value/frequency pairs reported for low-cardinality columns.
pub const TOP_VALUES_LIMIT: usize = 5;

/// Computes statistics for one column.
///
/// Never fails: any error is folded into the returned record.
pub async fn compute_column_stats<C>(
    connector: &C,
    table: &str,
    column: &str,
    data_type: &str,
    schema: Option<&str>,
) -> ColumnStats
where
    C: DatabaseConnector + ?Sized,
{
    let mut stats = ColumnStats::default();

    if let Err(error) =
        collect_column_stats(connector, &mut stats, table, column, data_type, schema).await
    {
        let error = match error {
            e @ DbInspectError::StatisticsComputation { .. } => e,
            other => DbInspectError::statistics(column, other.to_string()),
        };
        warn!("Statistics for {}.{} incomplete: {}", table, column, error);
        stats.error = Some(error.to_string());
    }

    stats
}

async fn collect_column_stats<C>(
    connector: &C,
    stats: &mut ColumnStats,
    table: &str,
    column: &str,
    data_type: &str,
    schema: Option<&str>,
) -> Result<()>
where
    C: DatabaseConnector + ?Sized,
{
    let tbl = connector.qualified_table(table, schema);
    let col = connector.quote_identifier(column);
    let (is_numeric, is_temporal) = {
        let classifier = connector.type_classifier();
        (
            classifier.is_numeric(data_type),
            classifier.is_temporal(data_type),
        )
    };

    // Row and null counts
    let total = count(connector, column, &format!("SELECT COUNT(*) AS c FROM {tbl}")).await?;
    let nulls = count(
        connector,
        column,
        &format!("SELECT COUNT(*) AS c FROM {tbl} WHERE {col} IS NULL"),
    )
    .await?;
    let non_null = total.saturating_sub(nulls);

    stats.total_rows = Some(total);
    stats.null_count = Some(nulls);
    stats.null_pct = Some(percentage(nulls, total));
    stats.completeness_pct = Some(percentage(non_null, total));

    // Cardinality over non-null values
    let distinct = count(
        connector,
        column,
        &format!("SELECT COUNT(DISTINCT {col}) AS c FROM {tbl}"),
    )
    .await?;
    stats.distinct_count = Some(distinct);
    stats.uniqueness_pct = Some(percentage(distinct, non_null).min(100.0));

    if is_numeric {
        numeric_summary(connector, stats, &tbl, &col).await?;
    }

    if distinct <= TOP_VALUES_MAX_DISTINCT {
        let rows = connector
            .execute(
                &format!(
                    "SELECT {col} AS val, COUNT(*) AS freq FROM {tbl} WHERE {col} IS NOT NULL \
                     GROUP BY {col} ORDER BY freq DESC, val LIMIT {TOP_VALUES_LIMIT}"
                ),
                &[],
            )
            .await?;
        stats.top_values = Some(
            rows.iter()
                .map(|row| TopValue {
                    value: row.get_string("val").unwrap_or_default(),
                    count: row.get_u64("freq").unwrap_or(0),
                })
                .collect(),
        );
    }

    if is_temporal {
        let rows = connector
            .execute(
                &format!("SELECT MIN({col}) AS mn, MAX({col}) AS mx FROM {tbl}"),
                &[],
            )
            .await?;
        if let Some(row) = rows.first() {
            stats.min_date = row.get_string("mn");
            stats.max_date = row.get_string("mx");
        }
    }

    Ok(())
}

/// MIN/MAX/AVG/SUM in one pass, then population standard deviation.
async fn numeric_summary<C>(connector: &C, stats: &mut ColumnStats, tbl: &str, col: &str) -> Result<()>
where
    C: DatabaseConnector + ?Sized,
{
    let rows = connector
        .execute(
            &format!(
                "SELECT MIN({col}) AS mn, MAX({col}) AS mx, AVG({col}) AS avg, SUM({col}) AS total \
                 FROM {tbl} WHERE {col} IS NOT NULL"
            ),
            &[],
        )
        .await?;

    let Some(row) = rows.first().filter(|row| row.value("mn").is_some()) else {
        return Ok(());
    };

    let mean = row.get_f64("avg").unwrap_or(0.0);
    stats.min = row.get_f64("mn");
    stats.max = row.get_f64("mx");
    stats.avg = Some(round_to(mean, 4));
    stats.sum = row.get_f64("total");

    // Best-effort second pass
    let variance_sql = format!(
        "SELECT AVG(({col} - ({mean})) * ({col} - ({mean}))) AS v FROM {tbl} WHERE {col} IS NOT NULL"
    );
    match connector.execute(&variance_sql, &[]).await {
        Ok(rows) => {
            if let Some(variance) = rows.first().and_then(|row| row.get_f64("v"))
                && variance >= 0.0
            {
                stats.std_dev = Some(round_to(variance.sqrt(), 4));
            }
        }
        Err(e) => debug!("Standard deviation skipped for {}: {}", col, e),
    }

    Ok(())
}

async fn count<C>(connector: &C, column: &str, sql: &str) -> Result<u64>
where
    C: DatabaseConnector + ?Sized,
{
    let rows = connector.execute(sql, &[]).await?;
    rows.first()
        .and_then(|row| row.get_u64("c"))
        .ok_or_else(|| DbInspectError::statistics(column, format!("no count returned by: {sql}")))
}
