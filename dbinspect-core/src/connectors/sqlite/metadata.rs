//! Catalog listings for SQLite.
//!
//! # Catalog Sources
//! - `sqlite_master`: tables and views
//! - `pragma_table_info()`: columns
//! - `pragma_foreign_key_list()`: foreign keys
//! - `pragma_index_list()` / `pragma_index_info()`: indexes
//!
//! The table-valued PRAGMA functions are used so names are bound as
//! parameters instead of being spliced into the statement.

use super::SqliteConnector;
use crate::Result;
use crate::connectors::DatabaseConnector;
use crate::connectors::helpers::RowExt;
use crate::models::{ColumnMetadata, ForeignKeyRef, IndexInfo, QueryParam, TableKind, TableMetadata};

/// Lists user tables and views with their row counts.
///
/// A table whose count fails (for example a view over a missing table)
/// is reported with 0 rows.
pub async fn list_tables(connector: &SqliteConnector) -> Result<Vec<TableMetadata>> {
    let rows = connector
        .execute(
            "SELECT name, type FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
            &[],
        )
        .await?;

    let mut tables = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(name) = row.get_string("name") else {
            continue;
        };
        let kind = match row.get_string("type").as_deref() {
            Some("view") => TableKind::View,
            _ => TableKind::Table,
        };

        let count_sql = format!("SELECT COUNT(*) AS cnt FROM {}", connector.quote_identifier(&name));
        let row_count = match connector.execute(&count_sql, &[]).await {
            Ok(counted) => counted.first().and_then(|r| r.get_u64("cnt")).unwrap_or(0),
            Err(e) => {
                tracing::debug!("Row count unavailable for {}: {}", name, e);
                0
            }
        };

        let mut table = TableMetadata::new(name, Some("main".to_string()), row_count);
        table.kind = kind;
        tables.push(table);
    }

    Ok(tables)
}

/// Lists columns in declaration order.
pub async fn list_columns(connector: &SqliteConnector, table: &str) -> Result<Vec<ColumnMetadata>> {
    let rows = connector
        .execute(
            "SELECT cid, name, type, \"notnull\", dflt_value, pk \
             FROM pragma_table_info(?1) ORDER BY cid",
            &[QueryParam::from(table)],
        )
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = row.get_string("name")?;
            let data_type = row.get_string("type").unwrap_or_default();
            let position = row.get_u64("cid").unwrap_or(0) + 1;
            let (length, precision, scale) = parse_type_modifiers(&data_type);

            let mut column = ColumnMetadata::new(name, data_type)
                .with_nullable(!row.get_bool("notnull").unwrap_or(false))
                .with_primary_key(row.get_u64("pk").unwrap_or(0) > 0)
                .with_ordinal_position(u32::try_from(position).unwrap_or(u32::MAX));
            column.default_value = row.get_string("dflt_value");
            column.character_maximum_length = length;
            column.numeric_precision = precision;
            column.numeric_scale = scale;
            Some(column)
        })
        .collect())
}

/// Lists foreign keys. A reference to the parent's implicit primary key has
/// an empty `referenced_column`.
pub async fn list_foreign_keys(connector: &SqliteConnector, table: &str) -> Result<Vec<ForeignKeyRef>> {
    let rows = connector
        .execute(
            "SELECT \"from\", \"table\", \"to\", on_delete, on_update \
             FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
            &[QueryParam::from(table)],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| ForeignKeyRef {
            column: row.get_string("from").unwrap_or_default(),
            referenced_table: row.get_string("table").unwrap_or_default(),
            referenced_column: row.get_string("to").unwrap_or_default(),
            on_delete: row.get_string("on_delete").unwrap_or_default(),
            on_update: row.get_string("on_update").unwrap_or_default(),
        })
        .collect())
}

/// Lists indexes, including the automatic ones backing UNIQUE and PRIMARY
/// KEY constraints.
pub async fn list_indexes(connector: &SqliteConnector, table: &str) -> Result<Vec<IndexInfo>> {
    let rows = connector
        .execute(
            "SELECT name, \"unique\" FROM pragma_index_list(?1) ORDER BY seq",
            &[QueryParam::from(table)],
        )
        .await?;

    let mut indexes = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(name) = row.get_string("name") else {
            continue;
        };
        let columns = connector
            .execute(
                "SELECT name FROM pragma_index_info(?1) ORDER BY seqno",
                &[QueryParam::from(name.as_str())],
            )
            .await?
            .iter()
            // Expression index entries have no column name
            .filter_map(|c| c.get_string("name"))
            .collect();

        indexes.push(IndexInfo {
            name,
            is_unique: row.get_bool("unique").unwrap_or(false),
            columns,
        });
    }

    Ok(indexes)
}

/// Extracts `(length, precision, scale)` from a declared type.
///
/// - `VARCHAR(255)` -> `(Some(255), None, None)`
/// - `DECIMAL(10,2)` -> `(None, Some(10), Some(2))`
/// - `INTEGER` -> `(None, None, None)`
pub(crate) fn parse_type_modifiers(declared: &str) -> (Option<u64>, Option<u32>, Option<u32>) {
    let upper = declared.to_ascii_uppercase();
    let Some((base, rest)) = upper.split_once('(') else {
        return (None, None, None);
    };
    let Some(args) = rest.strip_suffix(')') else {
        return (None, None, None);
    };
    let mut parts = args.split(',').map(str::trim);
    let first = parts.next().and_then(|p| p.parse::<u64>().ok());
    let second = parts.next().and_then(|p| p.parse::<u32>().ok());

    let is_numeric = ["DEC", "NUM", "REAL", "FLOA", "DOUB"]
        .iter()
        .any(|hint| base.contains(hint));
    if is_numeric {
        let precision = first.and_then(|p| u32::try_from(p).ok());
        (None, precision, second.or(precision.map(|_| 0)))
    } else {
        (first, None, None)
    }
}
