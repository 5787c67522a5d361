//! Per-type model facade.
//!
//! A [`Model<T>`] binds one registered application type to its table and a
//! connection manager. Metadata is looked up by the exact type `T`; a type
//! that wraps a registered type must be registered itself.

use crate::db::ConnectionManager;
use crate::error::{DbError, DbResult, PreconditionKind};
use crate::metadata::{MetadataRegistry, ModelMetadata};
use crate::models::{Row, Value};
use crate::query::QueryBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

pub struct Model<T> {
    registry: Arc<MetadataRegistry>,
    conn: Option<ConnectionManager>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("type", &type_name::<T>())
            .field("connected", &self.conn.is_some())
            .finish()
    }
}

impl<T: DeserializeOwned + 'static> Model<T> {
    pub fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self {
            registry,
            conn: None,
            _marker: PhantomData,
        }
    }

    pub fn set_connection(&mut self, conn: ConnectionManager) {
        self.conn = Some(conn);
    }

    pub fn with_connection(mut self, conn: ConnectionManager) -> Self {
        self.set_connection(conn);
        self
    }

    pub fn metadata(&self) -> Option<ModelMetadata> {
        self.registry.get_metadata::<T>()
    }

    fn precondition(kind: PreconditionKind) -> DbError {
        DbError::precondition(kind, type_name::<T>())
    }

    fn connection(&self) -> DbResult<&ConnectionManager> {
        self.conn
            .as_ref()
            .ok_or_else(|| Self::precondition(PreconditionKind::NoConnection))
    }

    /// Fetch the row whose primary key equals `id`.
    ///
    /// Fails before any database call when `T` has no metadata, no primary
    /// key, no table name, or when no connection is set, checked in that
    /// order.
    pub async fn find(&self, id: impl Into<Value>) -> DbResult<Option<T>> {
        let metadata = self
            .registry
            .get_metadata::<T>()
            .ok_or_else(|| Self::precondition(PreconditionKind::NoMetadata))?;
        let pk_column = metadata
            .primary_key_column()
            .ok_or_else(|| Self::precondition(PreconditionKind::NoPrimaryKey))?
            .to_string();
        if !metadata.has_table() {
            return Err(Self::precondition(PreconditionKind::NoTableName));
        }
        let conn = self.connection()?;

        debug!(model = type_name::<T>(), table = %metadata.table_name, "find");
        let row = QueryBuilder::create(conn, metadata.table_name.as_str())
            .select()
            .where_eq(pk_column, id)
            .get_one()
            .await?;

        row.map(|row| hydrate(&metadata, row)).transpose()
    }

    /// A fresh SELECT-ready builder bound to `T`'s table and the connection.
    pub fn query(&self) -> DbResult<QueryBuilder> {
        let table = self
            .registry
            .get_table_name::<T>()
            .ok_or_else(|| Self::precondition(PreconditionKind::NoTableName))?;
        let conn = self.connection()?;
        Ok(QueryBuilder::create(conn, table).select())
    }

    /// Build a `T` from a row fetched through [`Model::query`].
    pub fn from_row(&self, row: Row) -> DbResult<T> {
        let metadata = self.registry.get_metadata::<T>().unwrap_or_default();
        hydrate(&metadata, row)
    }
}

/// Populate a `T` from a row, renaming mapped columns to their properties.
fn hydrate<T: DeserializeOwned>(metadata: &ModelMetadata, mut row: Row) -> DbResult<T> {
    for column in metadata.columns.values() {
        if column.name != column.property_name {
            if let Some(value) = row.remove(&column.name) {
                row.insert(column.property_name.clone(), value);
            }
        }
    }

    serde_json::from_value(JsonValue::Object(row)).map_err(|e| {
        DbError::internal(format!(
            "Failed to map row onto {}: {}",
            type_name::<T>(),
            e
        ))
    })
}
