//! Type-identity keyed metadata store.

use super::{ColumnMetadata, ModelMetadata, RelationshipMetadata};
use crate::error::{DbError, DbResult};
use indexmap::IndexMap;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

static GLOBAL: OnceLock<Arc<MetadataRegistry>> = OnceLock::new();

/// Registry of [`ModelMetadata`] keyed by [`TypeId`].
///
/// Lookups never fail: a type that was never registered reads as `None` or
/// an empty map. Registration calls may arrive in any order; the first call
/// for a type creates its entry and every later call updates it in place
/// under the write lock.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: RwLock<HashMap<TypeId, ModelMetadata>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<MetadataRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(MetadataRegistry::new())))
    }

    // A panic while holding the lock cannot leave a half-written entry:
    // every mutation is a single map operation.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeId, ModelMetadata>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, ModelMetadata>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-or-create the entry for `T`, then apply `f` to it.
    fn update<T: 'static>(&self, f: impl FnOnce(&mut ModelMetadata)) {
        let mut entries = self.write();
        f(entries.entry(TypeId::of::<T>()).or_default());
    }

    /// Replace everything known about `T`.
    pub fn set_metadata<T: 'static>(&self, metadata: ModelMetadata) {
        debug!(model = type_name::<T>(), table = %metadata.table_name, "Metadata set");
        self.write().insert(TypeId::of::<T>(), metadata);
    }

    pub fn register_table<T: 'static>(&self, table_name: impl Into<String>) -> DbResult<()> {
        let table_name = table_name.into();
        if table_name.trim().is_empty() {
            return Err(DbError::invalid_input(format!(
                "Table name for {} must not be empty",
                type_name::<T>()
            )));
        }
        debug!(model = type_name::<T>(), table = %table_name, "Table registered");
        self.update::<T>(|meta| meta.table_name = table_name);
        Ok(())
    }

    /// Register a column, keyed by its property name. Re-registering a
    /// property replaces the previous column.
    pub fn register_column<T: 'static>(&self, column: ColumnMetadata) {
        self.update::<T>(|meta| {
            meta.columns.insert(column.property_name.clone(), column);
        });
    }

    pub fn register_primary_key<T: 'static>(&self, property: impl Into<String>) -> DbResult<()> {
        let property = property.into();
        if property.trim().is_empty() {
            return Err(DbError::invalid_input(format!(
                "Primary key for {} must not be empty",
                type_name::<T>()
            )));
        }
        self.update::<T>(|meta| meta.primary_key = Some(property));
        Ok(())
    }

    pub fn register_relationship<T: 'static>(&self, relationship: RelationshipMetadata) {
        self.update::<T>(|meta| {
            meta.relationships
                .insert(relationship.property_name.clone(), relationship);
        });
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.read().contains_key(&TypeId::of::<T>())
    }

    pub fn get_metadata<T: 'static>(&self) -> Option<ModelMetadata> {
        self.read().get(&TypeId::of::<T>()).cloned()
    }

    pub fn get_column_metadata<T: 'static>(&self, property: &str) -> Option<ColumnMetadata> {
        self.read()
            .get(&TypeId::of::<T>())
            .and_then(|meta| meta.columns.get(property).cloned())
    }

    pub fn get_relationship_metadata<T: 'static>(
        &self,
        property: &str,
    ) -> Option<RelationshipMetadata> {
        self.read()
            .get(&TypeId::of::<T>())
            .and_then(|meta| meta.relationships.get(property).cloned())
    }

    pub fn get_primary_key<T: 'static>(&self) -> Option<String> {
        self.read()
            .get(&TypeId::of::<T>())
            .and_then(|meta| meta.primary_key.clone())
    }

    /// `None` when `T` is unknown or has no table yet.
    pub fn get_table_name<T: 'static>(&self) -> Option<String> {
        self.read()
            .get(&TypeId::of::<T>())
            .filter(|meta| meta.has_table())
            .map(|meta| meta.table_name.clone())
    }

    pub fn get_all_columns<T: 'static>(&self) -> IndexMap<String, ColumnMetadata> {
        self.read()
            .get(&TypeId::of::<T>())
            .map(|meta| meta.columns.clone())
            .unwrap_or_default()
    }

    pub fn get_all_relationships<T: 'static>(&self) -> IndexMap<String, RelationshipMetadata> {
        self.read()
            .get(&TypeId::of::<T>())
            .map(|meta| meta.relationships.clone())
            .unwrap_or_default()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Forget every registration. Intended for test isolation.
    pub fn clear(&self) {
        self.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Airport;
    struct Flight;

    #[test]
    fn test_first_call_creates_entry() {
        let registry = MetadataRegistry::new();
        assert!(!registry.is_registered::<Airport>());

        registry.register_column::<Airport>(ColumnMetadata::new("code", "char").length(3));
        assert!(registry.is_registered::<Airport>());
        // A column alone does not make a table
        assert_eq!(registry.get_table_name::<Airport>(), None);
        assert_eq!(registry.get_all_columns::<Airport>().len(), 1);
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let a = MetadataRegistry::new();
        a.register_table::<Flight>("flights").unwrap();
        a.register_primary_key::<Flight>("id").unwrap();
        a.register_column::<Flight>(ColumnMetadata::new("id", "integer"));

        let b = MetadataRegistry::new();
        b.register_column::<Flight>(ColumnMetadata::new("id", "integer"));
        b.register_primary_key::<Flight>("id").unwrap();
        b.register_table::<Flight>("flights").unwrap();

        let (ma, mb) = (a.get_metadata::<Flight>().unwrap(), b.get_metadata::<Flight>().unwrap());
        assert_eq!(ma.table_name, mb.table_name);
        assert_eq!(ma.primary_key, mb.primary_key);
        assert_eq!(ma.columns, mb.columns);
    }

    #[test]
    fn test_empty_names_rejected() {
        let registry = MetadataRegistry::new();
        assert!(registry.register_table::<Flight>("  ").is_err());
        assert!(registry.register_primary_key::<Flight>("").is_err());
        assert!(!registry.is_registered::<Flight>());
    }

    #[test]
    fn test_missing_type_reads_empty() {
        let registry = MetadataRegistry::new();
        assert!(registry.get_metadata::<Airport>().is_none());
        assert!(registry.get_primary_key::<Airport>().is_none());
        assert!(registry.get_column_metadata::<Airport>("code").is_none());
        assert!(registry.get_relationship_metadata::<Airport>("flights").is_none());
        assert!(registry.get_all_columns::<Airport>().is_empty());
        assert!(registry.get_all_relationships::<Airport>().is_empty());
    }
}
