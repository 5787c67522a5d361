//! Registration macro.
//!
//! `register_model!` expands a declarative description of one type into the
//! individual `register_*` calls on a [`MetadataRegistry`](super::MetadataRegistry).
//! The expansion evaluates to `DbResult<()>`.

/// Register table, primary key, columns and relationships for a type.
///
/// # Example
///
/// ```ignore
/// register_model!(registry, Flight {
///     table: "flights",
///     primary_key: "id",
///     columns: [
///         ColumnMetadata::new("id", "integer").generated(),
///         ColumnMetadata::new("number", "varchar").length(8).unique(),
///     ],
///     relationships: [
///         RelationshipMetadata::one_to_many::<Ticket>("tickets"),
///     ],
/// })?;
/// ```
#[macro_export]
macro_rules! register_model {
    (
        $registry:expr, $model:ty {
            table: $table:expr
            $(, primary_key: $pk:expr)?
            $(, columns: [ $($column:expr),* $(,)? ])?
            $(, relationships: [ $($relationship:expr),* $(,)? ])?
            $(,)?
        }
    ) => {{
        let registry: &$crate::metadata::MetadataRegistry = &$registry;
        (|| -> $crate::error::DbResult<()> {
            registry.register_table::<$model>($table)?;
            $( registry.register_primary_key::<$model>($pk)?; )?
            $($( registry.register_column::<$model>($column); )*)?
            $($( registry.register_relationship::<$model>($relationship); )*)?
            Ok(())
        })()
    }};
}

#[cfg(test)]
mod tests {
    use crate::metadata::{ColumnMetadata, MetadataRegistry, RelationshipMetadata};

    struct Airport;
    struct Flight;

    #[test]
    fn test_register_model_expands_all_facets() {
        let registry = MetadataRegistry::new();
        register_model!(registry, Flight {
            table: "flights",
            primary_key: "id",
            columns: [
                ColumnMetadata::new("id", "integer").generated(),
                ColumnMetadata::new("origin", "char").length(3),
            ],
            relationships: [
                RelationshipMetadata::many_to_one::<Airport>("origin_airport"),
            ],
        })
        .unwrap();

        let meta = registry.get_metadata::<Flight>().unwrap();
        assert_eq!(meta.table_name, "flights");
        assert_eq!(meta.primary_key.as_deref(), Some("id"));
        let names: Vec<_> = meta.columns.keys().cloned().collect();
        assert_eq!(names, vec!["id", "origin"]);
        assert!(meta.relationships["origin_airport"].targets::<Airport>());
    }

    #[test]
    fn test_register_model_table_only() {
        let registry = MetadataRegistry::new();
        register_model!(registry, Airport { table: "airports" }).unwrap();
        assert_eq!(registry.get_table_name::<Airport>().as_deref(), Some("airports"));
        assert!(registry.get_primary_key::<Airport>().is_none());
    }

    #[test]
    fn test_register_model_propagates_errors() {
        let registry = MetadataRegistry::new();
        let result = register_model!(registry, Airport { table: "" });
        assert!(result.is_err());
    }
}
