use super::{Operand, Predicate, QueryDescriptor, StatementKind};
use crate::error::{DbError, DbResult};
use crate::models::Value;
use std::fmt;

/// A positional parameter reference, rendered as `$n` (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(pub usize);

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Compile a descriptor into SQL text and its parameter vector.
///
/// Placeholders are numbered from `$1` in emission order, so `params[i]`
/// binds placeholder `$i+1`. The same descriptor always compiles to the same
/// output.
pub fn compile(desc: &QueryDescriptor) -> DbResult<(String, Vec<Value>)> {
    let kind = desc.kind.ok_or_else(|| {
        DbError::compile(
            "No statement kind selected; call select(), insert(), update() or delete() first",
        )
    })?;
    if desc.table.trim().is_empty() {
        return Err(DbError::compile("No table specified"));
    }

    let mut sql = Sql::default();
    match kind {
        StatementKind::Select => sql.select(desc)?,
        StatementKind::Insert => sql.insert(desc)?,
        StatementKind::Update => sql.update(desc)?,
        StatementKind::Delete => sql.delete(desc)?,
    }

    Ok((sql.text, sql.params))
}

#[derive(Default)]
struct Sql {
    text: String,
    params: Vec<Value>,
}

impl Sql {
    fn push(&mut self, s: &str) {
        self.text.push_str(s);
    }

    fn bind(&mut self, value: Value) -> Placeholder {
        self.params.push(value);
        Placeholder(self.params.len())
    }

    fn bind_all<'a>(&mut self, values: impl IntoIterator<Item = &'a Value>) -> String {
        values
            .into_iter()
            .map(|v| self.bind(v.clone()).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn select(&mut self, desc: &QueryDescriptor) -> DbResult<()> {
        let columns = if desc.columns.is_empty() {
            "*".to_string()
        } else {
            desc.columns.join(", ")
        };
        self.push(&format!("SELECT {} FROM {}", columns, desc.table));

        for join in &desc.joins {
            self.push(&format!(" {} {}", join.kind.as_sql(), join.table));
            if let Some(alias) = &join.alias {
                self.push(&format!(" AS {}", alias));
            }
            self.push(&format!(" ON {}", join.on));
        }

        self.where_clause(&desc.wheres)?;

        if !desc.group_by.is_empty() {
            self.push(&format!(" GROUP BY {}", desc.group_by.join(", ")));
        }

        if !desc.having.is_empty() {
            self.push(" HAVING ");
            for (i, predicate) in desc.having.iter().enumerate() {
                if i > 0 {
                    self.push(" AND ");
                }
                self.predicate(predicate)?;
            }
        }

        if !desc.order_by.is_empty() {
            let order = desc
                .order_by
                .iter()
                .map(|o| format!("{} {}", o.field, o.direction.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            self.push(&format!(" ORDER BY {}", order));
        }

        if let Some(limit) = desc.limit {
            self.push(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = desc.offset {
            self.push(&format!(" OFFSET {}", offset));
        }
        Ok(())
    }

    fn insert(&mut self, desc: &QueryDescriptor) -> DbResult<()> {
        if desc.insert_values.is_empty() {
            return Err(DbError::compile("INSERT requires at least one value"));
        }
        let columns = desc
            .insert_values
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = self.bind_all(desc.insert_values.values());
        self.push(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            desc.table, columns, placeholders
        ));
        Ok(())
    }

    fn update(&mut self, desc: &QueryDescriptor) -> DbResult<()> {
        if desc.update_values.is_empty() {
            return Err(DbError::compile("UPDATE requires at least one value"));
        }
        let assignments = desc
            .update_values
            .iter()
            .map(|(column, value)| format!("{} = {}", column, self.bind(value.clone())))
            .collect::<Vec<_>>()
            .join(", ");
        self.push(&format!("UPDATE {} SET {}", desc.table, assignments));
        self.where_clause(&desc.wheres)
    }

    fn delete(&mut self, desc: &QueryDescriptor) -> DbResult<()> {
        self.push(&format!("DELETE FROM {}", desc.table));
        self.where_clause(&desc.wheres)
    }

    /// Flat chain: each predicate after the first is joined to everything
    /// before it by its own connective, with no grouping.
    fn where_clause(&mut self, predicates: &[Predicate]) -> DbResult<()> {
        if predicates.is_empty() {
            return Ok(());
        }
        self.push(" WHERE ");
        for (i, predicate) in predicates.iter().enumerate() {
            if i > 0 {
                self.push(if predicate.or { " OR " } else { " AND " });
            }
            self.predicate(predicate)?;
        }
        Ok(())
    }

    fn predicate(&mut self, predicate: &Predicate) -> DbResult<()> {
        let Predicate {
            field,
            operator,
            operand,
            ..
        } = predicate;

        if operator.is_unary() {
            self.push(&format!("{} {}", field, operator));
            return Ok(());
        }

        let rhs = match (operand, operator.is_membership()) {
            (Operand::List(values), true) if values.is_empty() => {
                return Err(DbError::compile(format!(
                    "{} on '{}' requires at least one value",
                    operator, field
                )));
            }
            (Operand::List(values), true) => format!("({})", self.bind_all(values)),
            (Operand::Scalar(value), true) => format!("({})", self.bind(value.clone())),
            (Operand::Scalar(value), false) => self.bind(value.clone()).to_string(),
            (Operand::List(_), false) => {
                return Err(DbError::compile(format!(
                    "Operator {} on '{}' does not accept a list",
                    operator, field
                )));
            }
            (Operand::None, _) => {
                return Err(DbError::compile(format!(
                    "Operator {} on '{}' requires a value",
                    operator, field
                )));
            }
        };

        self.push(&format!("{} {} {}", field, operator, rhs));
        Ok(())
    }
}
