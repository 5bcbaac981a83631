//! Catalog listings for PostgreSQL.

use super::PostgresConnector;
use crate::Result;
use crate::connectors::DatabaseConnector;
use crate::connectors::helpers::RowExt;
use crate::models::{ColumnMetadata, ForeignKeyRef, IndexInfo, QueryParam, TableKind, TableMetadata};
use serde_json::Value;

const LIST_SCHEMAS: &str = "\
    SELECT schema_name \
    FROM information_schema.schemata \
    WHERE schema_name NOT IN ('pg_catalog', 'information_schema', 'pg_toast') \
      AND schema_name NOT LIKE 'pg_temp_%' \
      AND schema_name NOT LIKE 'pg_toast_temp_%' \
    ORDER BY schema_name";

const LIST_TABLES: &str = "\
    SELECT t.table_name, t.table_type, \
           COALESCE(s.n_live_tup, 0) AS row_count, \
           CASE WHEN t.table_type = 'BASE TABLE' \
                THEN pg_total_relation_size(format('%I.%I', t.table_schema, t.table_name)::regclass) \
           END AS size_bytes, \
           obj_description(format('%I.%I', t.table_schema, t.table_name)::regclass, 'pg_class') AS comment \
    FROM information_schema.tables t \
    LEFT JOIN pg_stat_user_tables s \
      ON s.schemaname = t.table_schema AND s.relname = t.table_name \
    WHERE t.table_schema = $1 AND t.table_type IN ('BASE TABLE', 'VIEW') \
    ORDER BY t.table_name";

const LIST_COLUMNS: &str = "\
    SELECT c.column_name, c.data_type, c.is_nullable, c.column_default, c.ordinal_position, \
           c.character_maximum_length, c.numeric_precision, c.numeric_scale, \
           (pk.column_name IS NOT NULL) AS is_primary_key, \
           col_description(format('%I.%I', c.table_schema, c.table_name)::regclass, c.ordinal_position::int) AS comment \
    FROM information_schema.columns c \
    LEFT JOIN ( \
        SELECT kcu.column_name \
        FROM information_schema.table_constraints tc \
        JOIN information_schema.key_column_usage kcu \
          ON tc.constraint_name = kcu.constraint_name \
         AND tc.table_schema = kcu.table_schema \
         AND tc.table_name = kcu.table_name \
        WHERE tc.constraint_type = 'PRIMARY KEY' \
          AND tc.table_schema = $1 AND tc.table_name = $2 \
    ) pk ON pk.column_name = c.column_name \
    WHERE c.table_schema = $1 AND c.table_name = $2 \
    ORDER BY c.ordinal_position";

const LIST_FOREIGN_KEYS: &str = "\
    SELECT kcu.column_name, ccu.table_name AS referenced_table, \
           ccu.column_name AS referenced_column \
    FROM information_schema.table_constraints tc \
    JOIN information_schema.key_column_usage kcu \
      ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
    JOIN information_schema.constraint_column_usage ccu \
      ON ccu.constraint_name = tc.constraint_name AND ccu.constraint_schema = tc.table_schema \
    WHERE tc.constraint_type = 'FOREIGN KEY' \
      AND tc.table_schema = $1 AND tc.table_name = $2 \
    ORDER BY kcu.ordinal_position";

const LIST_INDEXES: &str = "\
    SELECT i.relname AS index_name, ix.indisunique AS is_unique, \
           ARRAY( \
               SELECT a.attname::text \
               FROM unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord) \
               JOIN pg_attribute a ON a.attrelid = ix.indrelid AND a.attnum = k.attnum \
               ORDER BY k.ord \
           ) AS columns \
    FROM pg_index ix \
    JOIN pg_class t ON t.oid = ix.indrelid \
    JOIN pg_class i ON i.oid = ix.indexrelid \
    JOIN pg_namespace n ON n.oid = t.relnamespace \
    WHERE n.nspname = $1 AND t.relname = $2 \
    ORDER BY i.relname";

pub(super) async fn list_schemas(connector: &PostgresConnector) -> Result<Vec<String>> {
    let rows = connector.execute(LIST_SCHEMAS, &[]).await?;
    Ok(rows.iter().filter_map(|r| r.get_string("schema_name")).collect())
}

pub(super) async fn list_tables(connector: &PostgresConnector, schema: &str) -> Result<Vec<TableMetadata>> {
    let rows = connector
        .execute(LIST_TABLES, &[QueryParam::from(schema)])
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = row.get_string("table_name")?;
            let mut table = TableMetadata::new(
                name,
                Some(schema.to_string()),
                row.get_u64("row_count").unwrap_or(0),
            );
            if row.get_string("table_type").as_deref() == Some("VIEW") {
                table.kind = TableKind::View;
            }
            table.size_bytes = row.get_u64("size_bytes");
            table.comment = row.get_string("comment");
            Some(table)
        })
        .collect())
}

pub(super) async fn list_columns(
    connector: &PostgresConnector,
    table: &str,
    schema: &str,
) -> Result<Vec<ColumnMetadata>> {
    let rows = connector
        .execute(LIST_COLUMNS, &[QueryParam::from(schema), QueryParam::from(table)])
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let position = row.get_u64("ordinal_position").unwrap_or(1);
            let mut column =
                ColumnMetadata::new(row.get_string("column_name")?, row.get_string("data_type").unwrap_or_default())
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

/// Foreign keys; `information_schema` does not expose the referential
/// actions on this path, so the rule strings are empty.
pub(super) async fn list_foreign_keys(
    connector: &PostgresConnector,
    table: &str,
    schema: &str,
) -> Result<Vec<ForeignKeyRef>> {
    let rows = connector
        .execute(LIST_FOREIGN_KEYS, &[QueryParam::from(schema), QueryParam::from(table)])
        .await?;

    Ok(rows
        .iter()
        .map(|row| ForeignKeyRef {
            column: row.get_string("column_name").unwrap_or_default(),
            referenced_table: row.get_string("referenced_table").unwrap_or_default(),
            referenced_column: row.get_string("referenced_column").unwrap_or_default(),
            on_delete: String::new(),
            on_update: String::new(),
        })
        .collect())
}

pub(super) async fn list_indexes(
    connector: &PostgresConnector,
    table: &str,
    schema: &str,
) -> Result<Vec<IndexInfo>> {
    let rows = connector
        .execute(LIST_INDEXES, &[QueryParam::from(schema), QueryParam::from(table)])
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            Some(IndexInfo {
                name: row.get_string("index_name")?,
                is_unique: row.get_bool("is_unique").unwrap_or(false),
                columns: string_array(row.value("columns")),
            })
        })
        .collect())
}

/// Strings of a JSON array; expression index slots come back as NULL and
/// are skipped.
pub(crate) fn string_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
