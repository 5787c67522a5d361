//! Data models for tarmac.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use connection::{ConnectionConfig, ConnectionConfigError, DatabaseType};
pub use schema::{
    ColumnDefinition, ForeignKey, ForeignKeyAction, TableInfo, TableSchema, TableType,
};
pub use value::{QueryResult, Row, Value};
