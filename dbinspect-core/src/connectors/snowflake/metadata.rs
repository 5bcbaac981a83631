//! `INFORMATION_SCHEMA` listings for Snowflake.
//!
//! Unquoted object names are stored upper-case in the catalog, so schema
//! and table names are upper-cased before being bound.

use super::SnowflakeConnector;
use crate::Result;
use crate::connectors::DatabaseConnector;
use crate::connectors::helpers::RowExt;
use crate::models::{ColumnMetadata, ForeignKeyRef, IndexInfo, QueryParam, TableKind, TableMetadata};

const LIST_SCHEMAS: &str = "\
    SELECT SCHEMA_NAME \
    FROM INFORMATION_SCHEMA.SCHEMATA \
    WHERE SCHEMA_NAME != 'INFORMATION_SCHEMA' \
    ORDER BY SCHEMA_NAME";

const LIST_TABLES: &str = "\
    SELECT TABLE_NAME, TABLE_TYPE, ROW_COUNT, BYTES, COMMENT, CLUSTERING_KEY \
    FROM INFORMATION_SCHEMA.TABLES \
    WHERE TABLE_SCHEMA = ? AND TABLE_TYPE IN ('BASE TABLE', 'VIEW') \
    ORDER BY TABLE_NAME";

const LIST_COLUMNS: &str = "\
    SELECT c.COLUMN_NAME, c.DATA_TYPE, c.IS_NULLABLE, c.COLUMN_DEFAULT, c.ORDINAL_POSITION, \
           c.CHARACTER_MAXIMUM_LENGTH, c.NUMERIC_PRECISION, c.NUMERIC_SCALE, c.COMMENT, \
           IFF(pk.COLUMN_NAME IS NOT NULL, TRUE, FALSE) AS IS_PRIMARY_KEY \
    FROM INFORMATION_SCHEMA.COLUMNS c \
    LEFT JOIN ( \
        SELECT kcu.COLUMN_NAME \
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
        JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
          ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
         AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA \
         AND kcu.TABLE_NAME = tc.TABLE_NAME \
        WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' \
          AND tc.TABLE_SCHEMA = ? AND tc.TABLE_NAME = ? \
    ) pk ON pk.COLUMN_NAME = c.COLUMN_NAME \
    WHERE c.TABLE_SCHEMA = ? AND c.TABLE_NAME = ? \
    ORDER BY c.ORDINAL_POSITION";

const LIST_FOREIGN_KEYS: &str = "\
    SELECT child.COLUMN_NAME, parent.TABLE_NAME AS REFERENCED_TABLE, \
           parent.COLUMN_NAME AS REFERENCED_COLUMN, rc.DELETE_RULE, rc.UPDATE_RULE \
    FROM INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc \
    JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE child \
      ON child.CONSTRAINT_NAME = rc.CONSTRAINT_NAME \
     AND child.CONSTRAINT_SCHEMA = rc.CONSTRAINT_SCHEMA \
    JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE parent \
      ON parent.CONSTRAINT_NAME = rc.UNIQUE_CONSTRAINT_NAME \
     AND parent.CONSTRAINT_SCHEMA = rc.UNIQUE_CONSTRAINT_SCHEMA \
     AND parent.ORDINAL_POSITION = child.ORDINAL_POSITION \
    WHERE child.TABLE_SCHEMA = ? AND child.TABLE_NAME = ? \
    ORDER BY child.ORDINAL_POSITION";

const PRIMARY_KEY_COLUMNS: &str = "\
    SELECT kcu.COLUMN_NAME \
    FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
    JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
      ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
     AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA \
     AND kcu.TABLE_NAME = tc.TABLE_NAME \
    WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' \
      AND tc.TABLE_SCHEMA = ? AND tc.TABLE_NAME = ? \
    ORDER BY kcu.ORDINAL_POSITION";

const CLUSTERING_KEY: &str = "\
    SELECT CLUSTERING_KEY \
    FROM INFORMATION_SCHEMA.TABLES \
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND CLUSTERING_KEY IS NOT NULL";

/// Name of the synthetic index describing the primary key.
pub const PRIMARY_KEY_INDEX: &str = "PRIMARY_KEY";

/// Name of the synthetic index describing the clustering key.
pub const CLUSTERING_KEY_INDEX: &str = "CLUSTERING_KEY";

fn names(schema: &str, table: &str) -> [QueryParam; 2] {
    [
        QueryParam::from(schema.to_uppercase()),
        QueryParam::from(table.to_uppercase()),
    ]
}

pub(super) async fn list_schemas(connector: &SnowflakeConnector) -> Result<Vec<String>> {
    let rows = connector.execute(LIST_SCHEMAS, &[]).await?;
    Ok(rows.iter().filter_map(|r| r.get_string("schema_name")).collect())
}

pub(super) async fn list_tables(connector: &SnowflakeConnector, schema: &str) -> Result<Vec<TableMetadata>> {
    let schema = schema.to_uppercase();
    let rows = connector
        .execute(LIST_TABLES, &[QueryParam::from(schema.as_str())])
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let mut table = TableMetadata::new(
                row.get_string("table_name")?,
                Some(schema.clone()),
                row.get_u64("row_count").unwrap_or(0),
            );
            if row.get_string("table_type").as_deref() == Some("VIEW") {
                table.kind = TableKind::View;
            }
            table.size_bytes = row.get_u64("bytes");
            table.comment = row.get_string("comment");
            table.clustering_key = row.get_string("clustering_key");
            Some(table)
        })
        .collect())
}

pub(super) async fn list_columns(
    connector: &SnowflakeConnector,
    table: &str,
    schema: &str,
) -> Result<Vec<ColumnMetadata>> {
    let [sch, tbl] = names(schema, table);
    let rows = connector
        .execute(LIST_COLUMNS, &[sch.clone(), tbl.clone(), sch, tbl])
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let position = row.get_u64("ordinal_position").unwrap_or(1);
            let mut column = ColumnMetadata::new(
                row.get_string("column_name")?,
                row.get_string("data_type").unwrap_or_default(),
            )
            .with_nullable(row.get_bool("is_nullable").unwrap_or(true))
            .with_primary_key(row.get_bool("is_primary_key").unwrap_or(false))
            .with_ordinal_position(u32::try_from(position).unwrap_or(u32::MAX));
            column.default_value = row.get_string("column_default");
            column.character_maximum_length = row.get_u64("character_maximum_length");
            column.numeric_precision = row
                .get_u64("numeric_precision")
                .and_then(|p| u32::try_from(p).ok());
            column.numeric_scale = row.get_u64("numeric_scale").and_then(|s| u32::try_from(s).ok());
            column.comment = row.get_string("comment");
            Some(column)
        })
        .collect())
}

pub(super) async fn list_foreign_keys(
    connector: &SnowflakeConnector,
    table: &str,
    schema: &str,
) -> Result<Vec<ForeignKeyRef>> {
    let rows = connector
        .execute(LIST_FOREIGN_KEYS, &names(schema, table))
        .await?;

    Ok(rows
        .iter()
        .map(|row| ForeignKeyRef {
            column: row.get_string("column_name").unwrap_or_default(),
            referenced_table: row.get_string("referenced_table").unwrap_or_default(),
            referenced_column: row.get_string("referenced_column").unwrap_or_default(),
            on_delete: row.get_string("delete_rule").unwrap_or_default(),
            on_update: row.get_string("update_rule").unwrap_or_default(),
        })
        .collect())
}

/// Snowflake has no user indexes; the primary key and clustering key are
/// reported as synthetic entries instead.
pub(super) async fn list_indexes(
    connector: &SnowflakeConnector,
    table: &str,
    schema: &str,
) -> Result<Vec<IndexInfo>> {
    let mut indexes = Vec::new();

    let pk_columns: Vec<String> = connector
        .execute(PRIMARY_KEY_COLUMNS, &names(schema, table))
        .await?
        .iter()
        .filter_map(|r| r.get_string("column_name"))
        .collect();
    if !pk_columns.is_empty() {
        indexes.push(IndexInfo {
            name: PRIMARY_KEY_INDEX.to_string(),
            is_unique: true,
            columns: pk_columns,
        });
    }

    let clustering = connector
        .execute(CLUSTERING_KEY, &names(schema, table))
        .await?
        .first()
        .and_then(|r| r.get_string("clustering_key"));
    if let Some(key) = clustering {
        indexes.push(IndexInfo {
            name: CLUSTERING_KEY_INDEX.to_string(),
            is_unique: false,
            columns: clustering_columns(&key),
        });
    }

    Ok(indexes)
}

/// Column list of a clustering key expression such as
/// `LINEAR(REGION, "order_date")`. Anything else is kept whole.
pub(crate) fn clustering_columns(key: &str) -> Vec<String> {
    let trimmed = key.trim();
    let inner = trimmed
        .strip_prefix("LINEAR(")
        .or_else(|| trimmed.strip_prefix("linear("))
        .and_then(|rest| rest.strip_suffix(')'));
    match inner {
        Some(list) => list
            .split(',')
            .map(|part| part.trim().trim_matches('"').to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        None => vec![trimmed.to_string()],
    }
}
