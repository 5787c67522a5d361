//! Fluent query building.
//!
//! A [`QueryBuilder`] accumulates intent into a [`QueryDescriptor`]; the
//! descriptor compiles to SQL text with `$1, $2, ...` placeholders and the
//! matching parameter vector. Compiling is pure: it never touches the
//! database and never mutates the descriptor.

mod builder;
mod compile;
mod predicate;

pub use builder::QueryBuilder;
pub use compile::{Placeholder, compile};
pub use predicate::{IntoOperator, Operand, Operator, Predicate};

use crate::models::Value;
use indexmap::IndexMap;

/// Statement kind. Unset on a fresh builder; the last selection wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    /// Join condition, rendered verbatim.
    pub on: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Accumulated query intent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryDescriptor {
    pub kind: Option<StatementKind>,
    pub table: String,
    /// Projection; empty means `*`.
    pub columns: Vec<String>,
    pub wheres: Vec<Predicate>,
    /// Rendered for SELECT only.
    pub joins: Vec<Join>,
    pub group_by: Vec<String>,
    /// Always joined with AND.
    pub having: Vec<Predicate>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub insert_values: IndexMap<String, Value>,
    pub update_values: IndexMap<String, Value>,
}

impl QueryDescriptor {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }
}
