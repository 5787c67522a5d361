//! Integration tests for the metadata registry.

use std::sync::Arc;
use tarmac::db::create_table_sql;
use tarmac::{
    ColumnMetadata, MetadataRegistry, ModelMetadata, RelationshipKind, RelationshipMetadata,
    RelationshipOptions, register_model,
};

struct Airport;
struct Flight;
struct Ticket;

/// Wraps a registered type without registering itself.
#[allow(dead_code)]
struct DelayedFlight(Flight);

fn register_all(registry: &MetadataRegistry) {
    register_model!(registry, Airport {
        table: "airports",
        primary_key: "code",
        columns: [
            ColumnMetadata::new("code", "char").length(3),
            ColumnMetadata::new("name", "varchar").length(120).nullable(false),
        ],
        relationships: [
            RelationshipMetadata::one_to_many::<Flight>("departures").inverse_side("origin"),
        ],
    })
    .unwrap();

    register_model!(registry, Flight {
        table: "flights",
        primary_key: "id",
        columns: [
            ColumnMetadata::new("id", "integer").generated(),
            ColumnMetadata::new("number", "varchar").length(8).unique(),
            ColumnMetadata::new("origin", "char").length(3),
        ],
        relationships: [
            RelationshipMetadata::many_to_one::<Airport>("origin"),
            RelationshipMetadata::one_to_many::<Ticket>("tickets").with_options(
                RelationshipOptions {
                    cascade: Some(true),
                    ..Default::default()
                },
            ),
        ],
    })
    .unwrap();
}

#[test]
fn test_metadata_is_not_inherited() {
    let registry = MetadataRegistry::new();
    register_all(&registry);

    assert!(registry.get_metadata::<Flight>().is_some());
    assert!(registry.get_metadata::<DelayedFlight>().is_none());
    assert!(registry.get_table_name::<DelayedFlight>().is_none());
    assert!(registry.get_all_columns::<DelayedFlight>().is_empty());
}

#[test]
fn test_relationships_resolve_lazily() {
    let registry = MetadataRegistry::new();
    register_all(&registry);

    let departures = registry
        .get_relationship_metadata::<Airport>("departures")
        .unwrap();
    assert_eq!(departures.kind, RelationshipKind::OneToMany);
    assert!(departures.targets::<Flight>());
    assert_eq!(departures.inverse_side.as_deref(), Some("origin"));

    let tickets = registry
        .get_relationship_metadata::<Flight>("tickets")
        .unwrap();
    assert_eq!(tickets.options.cascade, Some(true));
    // Ticket was never registered; the relationship still names it
    assert!(tickets.target_type_name().ends_with("Ticket"));
    assert!(!registry.is_registered::<Ticket>());

    let relationships = registry.get_all_relationships::<Flight>();
    let keys: Vec<&str> = relationships.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["origin", "tickets"]);
}

#[test]
fn test_set_metadata_overwrites() {
    let registry = MetadataRegistry::new();
    register_all(&registry);

    registry.set_metadata::<Flight>(
        ModelMetadata::new("legs").with_column(ColumnMetadata::new("leg_id", "bigint")),
    );

    let meta = registry.get_metadata::<Flight>().unwrap();
    assert_eq!(meta.table_name, "legs");
    assert!(meta.primary_key.is_none());
    assert_eq!(meta.columns.len(), 1);
    assert!(meta.relationships.is_empty());
}

#[test]
fn test_later_registration_updates_entry() {
    let registry = MetadataRegistry::new();
    register_all(&registry);

    registry.register_column::<Flight>(ColumnMetadata::new("number", "varchar").length(10));
    let number = registry.get_column_metadata::<Flight>("number").unwrap();
    assert_eq!(number.options.length, Some(10));
    // Position is kept when a property is re-registered
    let keys: Vec<String> = registry.get_all_columns::<Flight>().keys().cloned().collect();
    assert_eq!(keys, vec!["id", "number", "origin"]);

    registry.register_primary_key::<Flight>("number").unwrap();
    assert_eq!(registry.get_primary_key::<Flight>().as_deref(), Some("number"));
}

#[test]
fn test_clear() {
    let registry = MetadataRegistry::new();
    register_all(&registry);
    assert_eq!(registry.len(), 2);

    registry.clear();
    assert!(registry.is_empty());
    assert!(registry.get_metadata::<Airport>().is_none());
}

#[test]
fn test_concurrent_registration() {
    let registry = Arc::new(MetadataRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                registry.register_column::<Ticket>(ColumnMetadata::new(format!("c{}", i), "text"));
                registry.get_table_name::<Ticket>()
            })
        })
        .collect();
    registry.register_table::<Ticket>("tickets").unwrap();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.get_all_columns::<Ticket>().len(), 8);
    assert_eq!(registry.get_table_name::<Ticket>().as_deref(), Some("tickets"));
}

#[test]
fn test_ddl_from_registered_metadata() {
    let registry = MetadataRegistry::new();
    register_all(&registry);

    let sql = create_table_sql(&registry.get_metadata::<Flight>().unwrap()).unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE flights (\n    \
         id integer GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,\n    \
         number varchar(8) UNIQUE,\n    \
         origin char(3)\n)"
    );
}
