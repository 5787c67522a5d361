//! tarmac
//!
//! A lightweight persistence layer for PostgreSQL and SQLite: pooled
//! connections with explicit transactions, a type-keyed metadata registry,
//! a fluent query builder compiling to `$n`-parameterized SQL, a per-type
//! model facade and schema introspection.

pub mod config;
pub mod db;
pub mod error;
pub mod metadata;
pub mod model;
pub mod models;
pub mod query;

pub use config::Config;
pub use db::{ConnectionManager, SchemaInspector, TransactionHandle};
pub use error::{DbError, DbResult, PreconditionKind};
pub use metadata::{
    ColumnMetadata, ColumnOptions, MetadataRegistry, ModelMetadata, RelationshipKind,
    RelationshipMetadata, RelationshipOptions,
};
pub use model::Model;
pub use models::{ConnectionConfig, DatabaseType, QueryResult, Row, Value};
pub use query::{Direction, JoinKind, Operand, Operator, QueryBuilder};
