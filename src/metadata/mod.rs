//! Mapping metadata for application types.
//!
//! Each registered type owns exactly one [`ModelMetadata`]: the table it maps
//! to, its primary key property, its columns and its relationships. Metadata
//! is keyed by exact type identity in the [`MetadataRegistry`]; a wrapper
//! type never sees the metadata of the type it wraps.

#[macro_use]
pub mod macros;
pub mod registry;

pub use registry::MetadataRegistry;

use indexmap::IndexMap;
use std::any::TypeId;

/// Everything known about one registered type.
#[derive(Debug, Clone, Default)]
pub struct ModelMetadata {
    /// Empty until a table has been registered.
    pub table_name: String,
    /// Property name of the primary key.
    pub primary_key: Option<String>,
    /// Keyed by property name, in registration order.
    pub columns: IndexMap<String, ColumnMetadata>,
    /// Keyed by property name, in registration order.
    pub relationships: IndexMap<String, RelationshipMetadata>,
}

impl ModelMetadata {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn with_primary_key(mut self, property: impl Into<String>) -> Self {
        self.primary_key = Some(property.into());
        self
    }

    pub fn with_column(mut self, column: ColumnMetadata) -> Self {
        self.columns.insert(column.property_name.clone(), column);
        self
    }

    pub fn with_relationship(mut self, relationship: RelationshipMetadata) -> Self {
        self.relationships
            .insert(relationship.property_name.clone(), relationship);
        self
    }

    /// Whether a non-empty table name has been registered.
    pub fn has_table(&self) -> bool {
        !self.table_name.is_empty()
    }

    /// Database column for a property, falling back to the property name
    /// itself when the property has no registered column.
    pub fn column_name<'a>(&'a self, property: &'a str) -> &'a str {
        self.columns
            .get(property)
            .map(|c| c.name.as_str())
            .unwrap_or(property)
    }

    /// Database column of the primary key.
    pub fn primary_key_column(&self) -> Option<&str> {
        self.primary_key.as_deref().map(|pk| self.column_name(pk))
    }
}

/// Optional column attributes. `None` leaves the database default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOptions {
    pub length: Option<u32>,
    pub nullable: Option<bool>,
    pub unique: Option<bool>,
    pub default: Option<String>,
    pub generated: Option<bool>,
}

/// One mapped property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name in the database.
    pub name: String,
    pub property_name: String,
    /// SQL type as written in DDL (`varchar`, `integer`, ...).
    pub sql_type: String,
    pub options: ColumnOptions,
}

impl ColumnMetadata {
    /// A column named after its property.
    pub fn new(property_name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        let property_name = property_name.into();
        Self {
            name: property_name.clone(),
            property_name,
            sql_type: sql_type.into(),
            options: ColumnOptions::default(),
        }
    }

    /// Map the property to a differently named column.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.options.length = Some(length);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.options.nullable = Some(nullable);
        self
    }

    pub fn unique(mut self) -> Self {
        self.options.unique = Some(true);
        self
    }

    /// Default expression, rendered verbatim into DDL.
    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.options.default = Some(expr.into());
        self
    }

    /// Value is produced by the database (identity / serial).
    pub fn generated(mut self) -> Self {
        self.options.generated = Some(true);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneToMany => write!(f, "one-to-many"),
            Self::ManyToOne => write!(f, "many-to-one"),
            Self::ManyToMany => write!(f, "many-to-many"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipOptions {
    pub lazy: Option<bool>,
    pub eager: Option<bool>,
    pub cascade: Option<bool>,
}

/// A relationship to another registered type.
///
/// Purely descriptive: nothing loads related rows. The target is resolved
/// lazily through function pointers, so two types may reference each other
/// regardless of registration order.
#[derive(Debug, Clone)]
pub struct RelationshipMetadata {
    pub kind: RelationshipKind,
    pub property_name: String,
    /// Property on the target that points back.
    pub inverse_side: Option<String>,
    pub options: RelationshipOptions,
    target_type_id: fn() -> TypeId,
    target_type_name: fn() -> &'static str,
}

impl RelationshipMetadata {
    pub fn new<Target: 'static>(kind: RelationshipKind, property_name: impl Into<String>) -> Self {
        Self {
            kind,
            property_name: property_name.into(),
            inverse_side: None,
            options: RelationshipOptions::default(),
            target_type_id: TypeId::of::<Target>,
            target_type_name: std::any::type_name::<Target>,
        }
    }

    pub fn one_to_many<Target: 'static>(property_name: impl Into<String>) -> Self {
        Self::new::<Target>(RelationshipKind::OneToMany, property_name)
    }

    pub fn many_to_one<Target: 'static>(property_name: impl Into<String>) -> Self {
        Self::new::<Target>(RelationshipKind::ManyToOne, property_name)
    }

    pub fn many_to_many<Target: 'static>(property_name: impl Into<String>) -> Self {
        Self::new::<Target>(RelationshipKind::ManyToMany, property_name)
    }

    pub fn inverse_side(mut self, property: impl Into<String>) -> Self {
        self.inverse_side = Some(property.into());
        self
    }

    pub fn with_options(mut self, options: RelationshipOptions) -> Self {
        self.options = options;
        self
    }

    pub fn target_type_id(&self) -> TypeId {
        (self.target_type_id)()
    }

    pub fn target_type_name(&self) -> &'static str {
        (self.target_type_name)()
    }

    /// Whether the relationship points at `Target`.
    pub fn targets<Target: 'static>(&self) -> bool {
        self.target_type_id() == TypeId::of::<Target>()
    }
}

impl PartialEq for RelationshipMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.property_name == other.property_name
            && self.inverse_side == other.inverse_side
            && self.options == other.options
            && self.target_type_id() == other.target_type_id()
    }
}
