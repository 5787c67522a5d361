//! DDL text rendering from registered metadata.
//!
//! Renders PostgreSQL-flavored `CREATE TABLE` / `DROP TABLE` statements.
//! Nothing here executes the text it produces.

use crate::error::{DbError, DbResult};
use crate::metadata::{ColumnMetadata, ModelMetadata};

/// Render `CREATE TABLE` for a registered type.
///
/// Columns appear in registration order. The primary key is declared inline
/// on its column, which must be one of the registered columns.
pub fn create_table_sql(metadata: &ModelMetadata) -> DbResult<String> {
    if !metadata.has_table() {
        return Err(DbError::invalid_input(
            "Cannot render CREATE TABLE without a table name",
        ));
    }
    if metadata.columns.is_empty() {
        return Err(DbError::invalid_input(format!(
            "Cannot render CREATE TABLE {} without columns",
            metadata.table_name
        )));
    }
    if let Some(pk) = &metadata.primary_key {
        if !metadata.columns.contains_key(pk) {
            return Err(DbError::invalid_input(format!(
                "Primary key '{}' is not a registered column of {}",
                pk, metadata.table_name
            )));
        }
    }

    let definitions = metadata
        .columns
        .values()
        .map(|column| {
            let is_pk = metadata.primary_key.as_deref() == Some(column.property_name.as_str());
            column_definition(column, is_pk)
        })
        .collect::<Vec<_>>();

    Ok(format!(
        "CREATE TABLE {} (\n    {}\n)",
        metadata.table_name,
        definitions.join(",\n    ")
    ))
}

/// Render `DROP TABLE`.
pub fn drop_table_sql(table_name: &str, if_exists: bool) -> String {
    if if_exists {
        format!("DROP TABLE IF EXISTS {}", table_name)
    } else {
        format!("DROP TABLE {}", table_name)
    }
}

fn column_definition(column: &ColumnMetadata, is_primary_key: bool) -> String {
    let options = &column.options;
    let mut parts = vec![column.name.clone(), sql_type(column)];

    if options.generated == Some(true) {
        parts.push("GENERATED BY DEFAULT AS IDENTITY".to_string());
    }
    if is_primary_key {
        parts.push("PRIMARY KEY".to_string());
    } else {
        if options.nullable == Some(false) {
            parts.push("NOT NULL".to_string());
        }
        if options.unique == Some(true) {
            parts.push("UNIQUE".to_string());
        }
    }
    if let Some(default) = &options.default {
        parts.push(format!("DEFAULT {}", default));
    }

    parts.join(" ")
}

fn sql_type(column: &ColumnMetadata) -> String {
    match column.options.length {
        Some(length) => format!("{}({})", column.sql_type, length),
        None => column.sql_type.clone(),
    }
}
