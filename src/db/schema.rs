//! Schema introspection.
//!
//! Reads live catalog information (tables, columns, primary keys, foreign
//! keys) through a [`ConnectionManager`]'s pool. Catalog SQL lives in the
//! `queries` submodule; database-specific readers are in `postgres` and
//! `sqlite`, each providing the same interface.

use crate::db::ddl;
use crate::db::pool::{ConnectionManager, DbPool};
use crate::error::{DbError, DbResult};
use crate::metadata::ModelMetadata;
use crate::models::{ColumnDefinition, ForeignKey, ForeignKeyAction, TableInfo, TableSchema};
use tracing::debug;

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// List tables and views. `schema` defaults to the connection's current
    /// schema on PostgreSQL and is ignored on SQLite.
    pub async fn list_tables(
        conn: &ConnectionManager,
        schema: Option<&str>,
    ) -> DbResult<Vec<TableInfo>> {
        match conn.pool() {
            DbPool::Postgres(p) => postgres::list_tables(p, schema).await,
            DbPool::SQLite(p) => sqlite::list_tables(p).await,
        }
    }

    /// Whether a table or view with this name exists.
    pub async fn table_exists(conn: &ConnectionManager, table_name: &str) -> DbResult<bool> {
        match conn.pool() {
            DbPool::Postgres(p) => postgres::table_exists(p, table_name).await,
            DbPool::SQLite(p) => sqlite::table_exists(p, table_name).await,
        }
    }

    /// Columns in ordinal order. Empty when the table does not exist.
    pub async fn get_columns(
        conn: &ConnectionManager,
        table_name: &str,
    ) -> DbResult<Vec<ColumnDefinition>> {
        match conn.pool() {
            DbPool::Postgres(p) => postgres::get_columns(p, table_name).await,
            DbPool::SQLite(p) => sqlite::get_columns(p, table_name).await,
        }
    }

    /// Primary key column names in key order.
    pub async fn get_primary_key(
        conn: &ConnectionManager,
        table_name: &str,
    ) -> DbResult<Vec<String>> {
        match conn.pool() {
            DbPool::Postgres(p) => postgres::get_primary_key(p, table_name).await,
            DbPool::SQLite(p) => sqlite::get_primary_key(p, table_name).await,
        }
    }

    pub async fn get_foreign_keys(
        conn: &ConnectionManager,
        table_name: &str,
    ) -> DbResult<Vec<ForeignKey>> {
        match conn.pool() {
            DbPool::Postgres(p) => postgres::get_foreign_keys(p, table_name).await,
            DbPool::SQLite(p) => sqlite::get_foreign_keys(p, table_name).await,
        }
    }

    /// Columns, primary key and foreign keys of one table.
    pub async fn describe_table(
        conn: &ConnectionManager,
        table_name: &str,
    ) -> DbResult<TableSchema> {
        let columns = Self::get_columns(conn, table_name).await?;
        if columns.is_empty() {
            return Err(DbError::invalid_input(format!(
                "Table '{}' not found",
                table_name
            )));
        }

        let primary_key = Self::get_primary_key(conn, table_name).await?;
        let foreign_keys = Self::get_foreign_keys(conn, table_name).await?;

        Ok(TableSchema {
            table_name: table_name.to_string(),
            columns,
            primary_key,
            foreign_keys,
        })
    }

    /// Render `CREATE TABLE` text for registered metadata.
    pub fn create_table_sql(metadata: &ModelMetadata) -> DbResult<String> {
        ddl::create_table_sql(metadata)
    }

    /// Render `DROP TABLE` text.
    pub fn drop_table_sql(table_name: &str, if_exists: bool) -> String {
        ddl::drop_table_sql(table_name, if_exists)
    }
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT table_schema, table_name, table_type
            FROM information_schema.tables
            WHERE table_schema = COALESCE($1, current_schema())
            AND table_type IN ('BASE TABLE', 'VIEW')
            ORDER BY table_name
            "#;

        pub const TABLE_EXISTS: &str = r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_name = $1 AND table_schema = current_schema()
            ) AS present
            "#;

        pub const COLUMNS: &str = r#"
        SELECT
            c.column_name,
            format_type(a.atttypid, a.atttypmod) AS column_type,
            c.is_nullable,
            c.column_default,
            EXISTS (
                SELECT 1
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                    ON tc.constraint_name = kcu.constraint_name
                    AND tc.table_schema = kcu.table_schema
                WHERE tc.table_name = c.table_name
                AND tc.table_schema = c.table_schema
                AND tc.constraint_type = 'PRIMARY KEY'
                AND kcu.column_name = c.column_name
            ) AS is_primary_key
        FROM information_schema.columns c
        JOIN pg_class t ON t.relname = c.table_name
        JOIN pg_namespace n ON n.oid = t.relnamespace AND n.nspname = c.table_schema
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attname = c.column_name
        WHERE c.table_name = $1 AND c.table_schema = current_schema()
        ORDER BY c.ordinal_position
        "#;

        pub const PRIMARY_KEY: &str = r#"
        SELECT kcu.column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
        WHERE tc.table_name = $1
        AND tc.table_schema = current_schema()
        AND tc.constraint_type = 'PRIMARY KEY'
        ORDER BY kcu.ordinal_position
        "#;

        pub const FOREIGN_KEYS: &str = r#"
        SELECT
            kcu.column_name,
            ccu.table_name AS foreign_table_name,
            ccu.column_name AS foreign_column_name,
            rc.delete_rule,
            rc.update_rule
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
        JOIN information_schema.constraint_column_usage ccu
            ON ccu.constraint_name = tc.constraint_name
            AND ccu.table_schema = tc.table_schema
        JOIN information_schema.referential_constraints rc
            ON rc.constraint_name = tc.constraint_name
            AND rc.constraint_schema = tc.table_schema
        WHERE tc.table_name = $1
        AND tc.table_schema = current_schema()
        AND tc.constraint_type = 'FOREIGN KEY'
        ORDER BY kcu.ordinal_position
        "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name, type FROM sqlite_master
            WHERE type IN ('table', 'view')
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;

        pub const TABLE_EXISTS: &str = r#"
            SELECT COUNT(*) AS present FROM sqlite_master
            WHERE type IN ('table', 'view') AND name = ?
            "#;

        pub const COLUMNS: &str = r#"
            SELECT name, type, "notnull" AS not_null, dflt_value, pk
            FROM pragma_table_info(?)
            ORDER BY cid
            "#;

        pub const FOREIGN_KEYS: &str = r#"
            SELECT "from", "table", "to", on_update, on_delete
            FROM pragma_foreign_key_list(?)
            ORDER BY id, seq
            "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use crate::models::TableType;
    use sqlx::{PgPool, Row};

    pub async fn list_tables(pool: &PgPool, schema: Option<&str>) -> DbResult<Vec<TableInfo>> {
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .bind(schema)
            .fetch_all(pool)
            .await?;

        let tables = rows
            .iter()
            .map(|row| {
                let schema_name: String = row.get("table_schema");
                let name: String = row.get("table_name");
                let type_str: String = row.get("table_type");
                TableInfo::new(name, TableType::from_catalog(&type_str)).with_schema(schema_name)
            })
            .collect::<Vec<_>>();

        debug!(
            count = tables.len(),
            schema = schema.unwrap_or("current_schema()"),
            "Listed PostgreSQL tables"
        );
        Ok(tables)
    }

    pub async fn table_exists(pool: &PgPool, table_name: &str) -> DbResult<bool> {
        let row = sqlx::query(queries::postgres::TABLE_EXISTS)
            .bind(table_name)
            .fetch_one(pool)
            .await?;
        Ok(row.try_get::<bool, _>("present")?)
    }

    pub async fn get_columns(pool: &PgPool, table_name: &str) -> DbResult<Vec<ColumnDefinition>> {
        let rows = sqlx::query(queries::postgres::COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let name: String = row.get("column_name");
                let column_type: String = row.get("column_type");
                let nullable: String = row.get("is_nullable");
                let default_value: Option<String> = row.try_get("column_default").ok().flatten();
                let is_pk: bool = row.get("is_primary_key");

                let mut col = ColumnDefinition::new(name, column_type, nullable == "YES");
                if let Some(def) = default_value {
                    col = col.with_default(def);
                }
                if is_pk {
                    col = col.primary_key();
                }
                col
            })
            .collect())
    }

    pub async fn get_primary_key(pool: &PgPool, table_name: &str) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::postgres::PRIMARY_KEY)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("column_name")).collect())
    }

    pub async fn get_foreign_keys(pool: &PgPool, table_name: &str) -> DbResult<Vec<ForeignKey>> {
        let rows = sqlx::query(queries::postgres::FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let delete_rule: String = row.get("delete_rule");
                let update_rule: String = row.get("update_rule");
                ForeignKey {
                    column: row.get("column_name"),
                    references_table: row.get("foreign_table_name"),
                    references_column: row.get("foreign_column_name"),
                    on_delete: ForeignKeyAction::parse(&delete_rule),
                    on_update: ForeignKeyAction::parse(&update_rule),
                }
            })
            .collect())
    }
}

mod sqlite {
    use super::*;
    use crate::models::TableType;
    use sqlx::{Row, SqlitePool};

    pub async fn list_tables(pool: &SqlitePool) -> DbResult<Vec<TableInfo>> {
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .fetch_all(pool)
            .await?;

        let tables = rows
            .iter()
            .map(|row| {
                let name: String = row.get("name");
                let type_str: String = row.get("type");
                TableInfo::new(name, TableType::from_catalog(&type_str))
            })
            .collect::<Vec<_>>();

        debug!(count = tables.len(), "Listed SQLite tables");
        Ok(tables)
    }

    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> DbResult<bool> {
        let row = sqlx::query(queries::sqlite::TABLE_EXISTS)
            .bind(table_name)
            .fetch_one(pool)
            .await?;
        Ok(row.try_get::<i64, _>("present")? > 0)
    }

    pub async fn get_columns(
        pool: &SqlitePool,
        table_name: &str,
    ) -> DbResult<Vec<ColumnDefinition>> {
        let rows = sqlx::query(queries::sqlite::COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let name: String = row.get("name");
                let data_type: String = row.get("type");
                let not_null: i64 = row.get("not_null");
                let default_value: Option<String> = row.try_get("dflt_value").ok().flatten();
                let pk: i64 = row.get("pk");

                // SQLite reports INTEGER PRIMARY KEY columns as nullable
                let mut col = ColumnDefinition::new(name, data_type, not_null == 0 && pk == 0);
                if let Some(def) = default_value {
                    col = col.with_default(def);
                }
                if pk > 0 {
                    col = col.primary_key();
                }
                col
            })
            .collect())
    }

    pub async fn get_primary_key(pool: &SqlitePool, table_name: &str) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::sqlite::COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        // `pk` is the 1-based position within the key, 0 for other columns
        let mut keyed: Vec<(i64, String)> = rows
            .iter()
            .filter_map(|row| {
                let pk: i64 = row.get("pk");
                (pk > 0).then(|| (pk, row.get("name")))
            })
            .collect();
        keyed.sort_by_key(|(pos, _)| *pos);
        Ok(keyed.into_iter().map(|(_, name)| name).collect())
    }

    pub async fn get_foreign_keys(
        pool: &SqlitePool,
        table_name: &str,
    ) -> DbResult<Vec<ForeignKey>> {
        let rows = sqlx::query(queries::sqlite::FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let on_update: String = row.get("on_update");
                let on_delete: String = row.get("on_delete");
                // "to" is NULL when the reference targets the parent's primary key
                let references_column: Option<String> = row.try_get("to").ok().flatten();
                ForeignKey {
                    column: row.get("from"),
                    references_table: row.get("table"),
                    references_column: references_column.unwrap_or_default(),
                    on_delete: ForeignKeyAction::parse(&on_delete),
                    on_update: ForeignKeyAction::parse(&on_update),
                }
            })
            .collect())
    }
}
