//! Bound values and query results.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A row as returned by the executor: column name to decoded value, in
/// column order.
pub type Row = serde_json::Map<String, JsonValue>;

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    Text(String),
    /// Arbitrary JSON document
    Json(JsonValue),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this value for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Json(_) => "json",
        }
    }

    /// Convert to the JSON representation used for rows.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Int(v) => JsonValue::Number((*v).into()),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string())),
            Self::Text(v) => JsonValue::String(v.clone()),
            Self::Json(v) => v.clone(),
        }
    }

    /// Interpret a CLI-style string: JSON scalars become typed values,
    /// anything else is text.
    pub fn parse_loose(s: &str) -> Self {
        match serde_json::from_str::<JsonValue>(s) {
            Ok(JsonValue::Null) => Self::Null,
            Ok(JsonValue::Bool(b)) => Self::Bool(b),
            Ok(JsonValue::Number(n)) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Text(s.to_string())),
            },
            Ok(JsonValue::String(text)) => Self::Text(text),
            Ok(other) => Self::Json(other),
            Err(_) => Self::Text(s.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Self::Json(v) => write!(f, "'{}'", v.to_string().replace('\'', "''")),
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )+
    };
}

impl_value_from!(
    bool => Bool,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
);

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Value::Null,
            other => Value::Json(other),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Rows plus the count reported for the statement.
///
/// `row_count` is the number of rows returned, or the number of rows affected
/// for statements that return none.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub row_count: u64,
}

impl QueryResult {
    /// Check if the result carries no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Take the first row, if any.
    pub fn into_first(self) -> Option<Row> {
        self.rows.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());
        assert_eq!(Value::from(42).type_name(), "int");
        assert_eq!(Value::from("hello").type_name(), "text");
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(Value::Int(7).to_json(), serde_json::json!(7));
        assert_eq!(Value::Text("a".into()).to_json(), serde_json::json!("a"));
        assert_eq!(Value::Null.to_json(), JsonValue::Null);
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(Value::parse_loose("18"), Value::Int(18));
        assert_eq!(Value::parse_loose("1.5"), Value::Float(1.5));
        assert_eq!(Value::parse_loose("true"), Value::Bool(true));
        assert_eq!(Value::parse_loose("null"), Value::Null);
        assert_eq!(Value::parse_loose("LAX"), Value::Text("LAX".into()));
        assert_eq!(Value::parse_loose("\"18\""), Value::Text("18".into()));
    }

    #[test]
    fn test_display_escapes_quotes() {
        assert_eq!(Value::from("O'Hare").to_string(), "'O''Hare'");
    }
}
