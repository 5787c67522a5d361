//! WHERE / HAVING predicates.

use crate::models::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// Operators that take no right-hand side.
    pub fn is_unary(&self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// Operators whose right-hand side is a parenthesized list.
    pub fn is_membership(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Collapse inner whitespace so "is  not null" parses too
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "=" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::NotEq),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Gte),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            "LIKE" => Ok(Self::Like),
            "ILIKE" => Ok(Self::ILike),
            "IN" => Ok(Self::In),
            "NOT IN" => Ok(Self::NotIn),
            "IS NULL" => Ok(Self::IsNull),
            "IS NOT NULL" => Ok(Self::IsNotNull),
            _ => Err(format!("Unsupported operator '{}'", s.trim())),
        }
    }
}

/// Anything a builder accepts in operator position: an [`Operator`] or its
/// SQL spelling.
pub trait IntoOperator {
    fn into_operator(self) -> Result<Operator, String>;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Result<Operator, String> {
        Ok(self)
    }
}

impl IntoOperator for &str {
    fn into_operator(self) -> Result<Operator, String> {
        self.parse()
    }
}

impl IntoOperator for String {
    fn into_operator(self) -> Result<Operator, String> {
        self.parse()
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No value, for `IS NULL` / `IS NOT NULL`.
    None,
    Scalar(Value),
    List(Vec<Value>),
}

macro_rules! impl_operand_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Scalar(v.into())
                }
            }
        )*
    };
}

impl_operand_from_scalar!(Value, bool, i16, i32, i64, u8, u16, u32, f32, f64, String, &str);

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(values: [T; N]) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Scalar(v.into())
    }
}

/// One link of a flat predicate chain.
///
/// `or` only matters for predicates after the first: it joins this predicate
/// to everything before it with `OR` instead of `AND`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    pub operand: Operand,
    pub or: bool,
}

impl Predicate {
    pub fn new(field: impl Into<String>, operator: Operator, operand: impl Into<Operand>) -> Self {
        Self {
            field: field.into(),
            operator,
            operand: operand.into(),
            or: false,
        }
    }

    pub fn or(mut self) -> Self {
        self.or = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse() {
        assert_eq!("=".parse::<Operator>(), Ok(Operator::Eq));
        assert_eq!("<>".parse::<Operator>(), Ok(Operator::NotEq));
        assert_eq!("ilike".parse::<Operator>(), Ok(Operator::ILike));
        assert_eq!("not in".parse::<Operator>(), Ok(Operator::NotIn));
        assert_eq!(" is  NOT null ".parse::<Operator>(), Ok(Operator::IsNotNull));
        assert!("==".parse::<Operator>().is_err());
        assert!("BETWEEN".parse::<Operator>().is_err());
    }

    #[test]
    fn test_operator_roundtrips_through_sql() {
        for op in [
            Operator::Eq,
            Operator::NotEq,
            Operator::Gte,
            Operator::Like,
            Operator::NotIn,
            Operator::IsNull,
        ] {
            assert_eq!(op.as_sql().parse::<Operator>(), Ok(op));
        }
    }

    #[test]
    fn test_operand_conversions() {
        assert_eq!(Operand::from(18), Operand::Scalar(Value::Int(18)));
        assert_eq!(Operand::from("LAX"), Operand::Scalar(Value::Text("LAX".into())));
        assert_eq!(
            Operand::from(vec![1, 2]),
            Operand::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            Operand::from(["a", "b"]),
            Operand::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(Operand::from(None::<i32>), Operand::Scalar(Value::Null));
    }
}
