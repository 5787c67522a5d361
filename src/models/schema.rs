//! Schema-related data models.
//!
//! This module defines the shapes returned by live catalog introspection.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    Table,
    View,
}

impl TableType {
    /// Classify a catalog table type string ("BASE TABLE", "table", "VIEW", ...).
    pub fn from_catalog(s: &str) -> Self {
        if s.to_ascii_lowercase().contains("view") {
            Self::View
        } else {
            Self::Table
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub table_type: TableType,
}

impl TableInfo {
    /// Create a new table info.
    pub fn new(name: impl Into<String>, table_type: TableType) -> Self {
        Self {
            name: name.into(),
            schema: None,
            table_type,
        }
    }

    /// Set the schema name.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// A column as reported by the live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// Database-specific type (e.g., "integer", "character varying(255)", "TEXT")
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub is_primary_key: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default_value: None,
            is_primary_key: false,
        }
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForeignKeyAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ForeignKeyAction {
    /// Parse a referential action as spelled by the catalogs.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            "RESTRICT" => Some(Self::Restrict),
            "NO ACTION" => Some(Self::NoAction),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ForeignKeyAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ForeignKeyAction>,
}

/// Everything the inspector knows about one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_type_from_catalog() {
        assert_eq!(TableType::from_catalog("BASE TABLE"), TableType::Table);
        assert_eq!(TableType::from_catalog("table"), TableType::Table);
        assert_eq!(TableType::from_catalog("VIEW"), TableType::View);
    }

    #[test]
    fn test_foreign_key_action_parse() {
        assert_eq!(ForeignKeyAction::parse("cascade"), Some(ForeignKeyAction::Cascade));
        assert_eq!(ForeignKeyAction::parse("SET NULL"), Some(ForeignKeyAction::SetNull));
        assert_eq!(ForeignKeyAction::parse("NO ACTION"), Some(ForeignKeyAction::NoAction));
        assert_eq!(ForeignKeyAction::parse("bogus"), None);
    }

    #[test]
    fn test_column_definition_builders() {
        let col = ColumnDefinition::new("id", "integer", false)
            .with_default("nextval('seq')")
            .primary_key();
        assert!(col.is_primary_key);
        assert_eq!(col.default_value.as_deref(), Some("nextval('seq')"));
    }
}
