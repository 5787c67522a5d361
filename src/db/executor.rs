//! Statement execution.
//!
//! Every statement, pooled or inside a transaction, ends up in one of the
//! database-specific `execute` functions below. They bind the positional
//! parameters in order, run the statement on the given connection and collect
//! both the returned rows and the affected-row count.
//!
//! # Architecture
//!
//! - `postgres`: PostgreSQL binding and execution
//! - `sqlite`: SQLite binding and execution
//!
//! Each submodule provides identical functionality adapted to the database's type system.

use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::models::{QueryResult, Row, Value};
use futures_util::TryStreamExt;
use sqlx::Either;
use std::time::Instant;
use tracing::debug;

/// Fold a stream of results/rows into a `QueryResult`.
fn finish<R: RowToJson>(rows: Vec<R>, rows_affected: u64, sql: &str, start: Instant) -> QueryResult {
    let rows: Vec<Row> = rows.iter().map(|r| r.to_json_map()).collect();
    let row_count = if rows.is_empty() {
        rows_affected
    } else {
        rows.len() as u64
    };

    debug!(
        sql = %sql,
        row_count = row_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Statement executed"
    );

    QueryResult { rows, row_count }
}

pub(crate) mod postgres {
    use super::*;
    use sqlx::encode::{Encode, IsNull};
    use sqlx::error::BoxDynError;
    use sqlx::postgres::types::Oid;
    use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgRow, PgTypeInfo};
    use sqlx::{PgConnection, Postgres, Type};

    /// A NULL sent without a parameter type, so the server infers it from
    /// the surrounding expression.
    struct UntypedNull;

    impl Type<Postgres> for UntypedNull {
        fn type_info() -> PgTypeInfo {
            PgTypeInfo::with_oid(Oid(0))
        }
    }

    impl Encode<'_, Postgres> for UntypedNull {
        fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
            Ok(IsNull::Yes)
        }
    }

    pub async fn execute(
        conn: &mut PgConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<QueryResult> {
        use sqlx::Executor;

        let start = Instant::now();
        let mut rows: Vec<PgRow> = Vec::new();
        let mut rows_affected = 0u64;

        // When params is empty, send the text as a simple query (no prepare step)
        let mut stream = if params.is_empty() {
            conn.fetch_many(sql)
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            conn.fetch_many(query)
        };

        while let Some(item) = stream.try_next().await.map_err(DbError::from)? {
            match item {
                Either::Left(done) => rows_affected += done.rows_affected(),
                Either::Right(row) => rows.push(row),
            }
        }
        drop(stream);

        Ok(finish(rows, rows_affected, sql, start))
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
        param: &'q Value,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
        match param {
            Value::Null => query.bind(UntypedNull),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            Value::Json(v) => query.bind(sqlx::types::Json(v)),
        }
    }
}

pub(crate) mod sqlite {
    use super::*;
    use sqlx::SqliteConnection;
    use sqlx::sqlite::{SqliteArguments, SqliteRow};

    pub async fn execute(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<QueryResult> {
        use sqlx::Executor;

        let start = Instant::now();
        let mut rows: Vec<SqliteRow> = Vec::new();
        let mut rows_affected = 0u64;

        let mut stream = if params.is_empty() {
            conn.fetch_many(sql)
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            conn.fetch_many(query)
        };

        while let Some(item) = stream.try_next().await.map_err(DbError::from)? {
            match item {
                Either::Left(done) => rows_affected += done.rows_affected(),
                Either::Right(row) => rows.push(row),
            }
        }
        drop(stream);

        Ok(finish(rows, rows_affected, sql, start))
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
        param: &'q Value,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
        match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            // SQLite doesn't have native JSON type, store as string
            Value::Json(v) => query.bind(v.to_string()),
        }
    }
}
