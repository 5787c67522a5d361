use super::{
    Direction, IntoOperator, Join, JoinKind, Operand, Operator, OrderBy, Predicate,
    QueryDescriptor, StatementKind, compile,
};
use crate::db::{ConnectionManager, TransactionHandle};
use crate::error::{DbError, DbResult, PreconditionKind};
use crate::models::{QueryResult, Row, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Fluent builder for one statement against one table.
///
/// Clause methods consume and return the builder; terminal methods borrow it,
/// so a builder can be compiled or executed more than once. A builder is not
/// meant to be shared between tasks while it is being built.
///
/// ```ignore
/// let adults = QueryBuilder::create(&conn, "users")
///     .select()
///     .where_("active", "=", true)
///     .and_where("age", Operator::Gt, 18)
///     .get_many()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    desc: QueryDescriptor,
    conn: Option<ConnectionManager>,
    raw: Option<(String, Vec<Value>)>,
    /// First invalid clause seen; reported when compiling.
    invalid: Option<String>,
}

impl QueryBuilder {
    /// A builder with no connection. It compiles but cannot execute.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            desc: QueryDescriptor::new(table),
            conn: None,
            raw: None,
            invalid: None,
        }
    }

    /// A builder bound to a connection manager.
    pub fn create(conn: &ConnectionManager, table: impl Into<String>) -> Self {
        Self::new(table).with_connection(conn.clone())
    }

    pub fn with_connection(mut self, conn: ConnectionManager) -> Self {
        self.conn = Some(conn);
        self
    }

    /// The accumulated intent.
    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.desc
    }

    // -------------------------------------------------------------------------
    // Statement kind
    // -------------------------------------------------------------------------

    pub fn select(mut self) -> Self {
        self.desc.kind = Some(StatementKind::Select);
        self
    }

    /// Set the projection. An empty list selects `*`.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.desc.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.desc.table = table.into();
        self
    }

    /// Turn the statement into an INSERT of `payload`, in iteration order.
    pub fn insert<I, K, V>(mut self, payload: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.desc.kind = Some(StatementKind::Insert);
        self.desc.insert_values = payload
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Turn the statement into an UPDATE setting `payload`, in iteration order.
    pub fn update<I, K, V>(mut self, payload: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.desc.kind = Some(StatementKind::Update);
        self.desc.update_values = payload
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn delete(mut self) -> Self {
        self.desc.kind = Some(StatementKind::Delete);
        self
    }

    /// Bypass compilation: `build_query` returns exactly this pair.
    pub fn raw(mut self, sql: impl Into<String>, params: Vec<Value>) -> Self {
        self.raw = Some((sql.into(), params));
        self
    }

    // -------------------------------------------------------------------------
    // WHERE
    // -------------------------------------------------------------------------

    fn push_where(
        mut self,
        field: impl Into<String>,
        op: impl IntoOperator,
        operand: impl Into<Operand>,
        or: bool,
    ) -> Self {
        match op.into_operator() {
            Ok(operator) => self.desc.wheres.push(Predicate {
                field: field.into(),
                operator,
                operand: operand.into(),
                or,
            }),
            Err(e) => {
                self.invalid.get_or_insert(e);
            }
        }
        self
    }

    /// Add a predicate joined with AND.
    pub fn where_(
        self,
        field: impl Into<String>,
        op: impl IntoOperator,
        operand: impl Into<Operand>,
    ) -> Self {
        self.push_where(field, op, operand, false)
    }

    pub fn and_where(
        self,
        field: impl Into<String>,
        op: impl IntoOperator,
        operand: impl Into<Operand>,
    ) -> Self {
        self.push_where(field, op, operand, false)
    }

    /// Add a predicate joined with OR. There is no grouping: `a AND b OR c`
    /// is rendered exactly like that.
    pub fn or_where(
        self,
        field: impl Into<String>,
        op: impl IntoOperator,
        operand: impl Into<Operand>,
    ) -> Self {
        self.push_where(field, op, operand, true)
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push_where(field, Operator::Eq, Operand::Scalar(value.into()), false)
    }

    pub fn where_null(self, field: impl Into<String>) -> Self {
        self.push_where(field, Operator::IsNull, Operand::None, false)
    }

    pub fn where_not_null(self, field: impl Into<String>) -> Self {
        self.push_where(field, Operator::IsNotNull, Operand::None, false)
    }

    pub fn where_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = Operand::List(values.into_iter().map(Into::into).collect());
        self.push_where(field, Operator::In, list, false)
    }

    // -------------------------------------------------------------------------
    // JOIN / GROUP BY / HAVING / ORDER BY / LIMIT / OFFSET
    // -------------------------------------------------------------------------

    /// Add a join. Joins only render for SELECT statements.
    pub fn join_with(
        mut self,
        kind: JoinKind,
        table: impl Into<String>,
        alias: Option<&str>,
        on: impl Into<String>,
    ) -> Self {
        self.desc.joins.push(Join {
            kind,
            table: table.into(),
            alias: alias.map(String::from),
            on: on.into(),
        });
        self
    }

    pub fn join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join_with(JoinKind::Inner, table, None, on)
    }

    pub fn left_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join_with(JoinKind::Left, table, None, on)
    }

    pub fn right_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join_with(JoinKind::Right, table, None, on)
    }

    pub fn full_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join_with(JoinKind::Full, table, None, on)
    }

    pub fn group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.desc.group_by.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Add a HAVING predicate. HAVING predicates are always joined with AND.
    pub fn having(
        mut self,
        field: impl Into<String>,
        op: impl IntoOperator,
        operand: impl Into<Operand>,
    ) -> Self {
        match op.into_operator() {
            Ok(operator) => self
                .desc
                .having
                .push(Predicate::new(field, operator, operand)),
            Err(e) => {
                self.invalid.get_or_insert(e);
            }
        }
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.desc.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.desc.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.desc.offset = Some(offset);
        self
    }

    // -------------------------------------------------------------------------
    // Compile / execute
    // -------------------------------------------------------------------------

    /// Compile to SQL text and parameters without touching the database.
    pub fn build_query(&self) -> DbResult<(String, Vec<Value>)> {
        if let Some((sql, params)) = &self.raw {
            return Ok((sql.clone(), params.clone()));
        }
        if let Some(message) = &self.invalid {
            return Err(DbError::compile(message.clone()));
        }
        compile(&self.desc)
    }

    fn connection(&self) -> DbResult<&ConnectionManager> {
        self.conn.as_ref().ok_or_else(|| {
            DbError::precondition(
                PreconditionKind::NoConnection,
                format!("QueryBuilder({})", self.desc.table),
            )
        })
    }

    async fn run(&self, sql: &str, params: &[Value]) -> DbResult<QueryResult> {
        let conn = self.connection()?;
        debug!(table = %self.desc.table, sql = %sql, params = params.len(), "Running built query");
        conn.query(sql, params).await
    }

    /// Compile and execute, returning rows and the reported row count.
    pub async fn execute(&self) -> DbResult<QueryResult> {
        let (sql, params) = self.build_query()?;
        self.run(&sql, &params).await
    }

    /// Compile and execute on the connection held by a transaction handle.
    pub async fn execute_in(&self, handle: &mut TransactionHandle) -> DbResult<QueryResult> {
        let (sql, params) = self.build_query()?;
        handle.execute(&sql, &params).await
    }

    pub async fn get_many(&self) -> DbResult<Vec<Row>> {
        Ok(self.execute().await?.rows)
    }

    /// First row, fetched with `LIMIT 1` regardless of any limit already set.
    pub async fn get_one(&self) -> DbResult<Option<Row>> {
        let (sql, params) = self.one_query()?;
        Ok(self.run(&sql, &params).await?.into_first())
    }

    /// The query `get_one` runs.
    pub fn one_query(&self) -> DbResult<(String, Vec<Value>)> {
        let mut snapshot = self.clone();
        snapshot.desc.limit = Some(1);
        snapshot.build_query()
    }

    /// Number of matching rows.
    ///
    /// Runs a copy of this SELECT with the projection replaced by
    /// `COUNT(*)` and ordering and paging removed; the builder itself is left
    /// unchanged whether or not the count succeeds.
    pub async fn count(&self) -> DbResult<i64> {
        let (sql, params) = self.count_query()?;
        let result = self.run(&sql, &params).await?;

        let Some(row) = result.into_first() else {
            return Ok(0);
        };
        let value = row.get("count").or_else(|| row.values().next());
        match value {
            Some(JsonValue::Number(n)) => n
                .as_i64()
                .ok_or_else(|| DbError::internal(format!("Count is not an integer: {}", n))),
            Some(JsonValue::String(s)) => s
                .parse()
                .map_err(|_| DbError::internal(format!("Count is not an integer: {}", s))),
            other => Err(DbError::internal(format!(
                "Unexpected count value: {:?}",
                other
            ))),
        }
    }

    /// The query `count` runs.
    pub fn count_query(&self) -> DbResult<(String, Vec<Value>)> {
        if self.raw.is_none() && self.desc.kind.is_some_and(|k| k != StatementKind::Select) {
            return Err(DbError::compile("count() requires a SELECT statement"));
        }
        let mut snapshot = self.clone();
        snapshot.desc.columns = vec!["COUNT(*) AS count".to_string()];
        snapshot.desc.order_by.clear();
        snapshot.desc.limit = None;
        snapshot.desc.offset = None;
        snapshot.build_query()
    }
}
