//! Database access layer.
//!
//! This module provides:
//! - Connection pool management and the process-wide manager
//! - Statement execution and parameter binding
//! - Caller-owned transactions
//! - Schema introspection and DDL rendering
//! - Row decoding into JSON values

pub mod ddl;
pub mod executor;
pub mod pool;
pub mod schema;
pub mod transaction;
pub mod types;

pub use ddl::{create_table_sql, drop_table_sql};
pub use pool::{ConnectionManager, DbPool, PoolStatus, PooledConnection};
pub use schema::SchemaInspector;
pub use transaction::{DbTransaction, TransactionHandle, TransactionState};
