//! Compile-only tests for the query builder.
//!
//! None of these touch a database: builders are created without a connection
//! and only `build_query` / `one_query` / `count_query` are exercised.

use tarmac::query::{Direction, JoinKind, Operand, Operator, QueryBuilder};
use tarmac::{DbError, Value};

#[test]
fn test_select_with_two_predicates() {
    let qb = QueryBuilder::new("users")
        .select()
        .where_("active", Operator::Eq, true)
        .and_where("age", Operator::Gt, 18);

    let (sql, params) = qb.build_query().unwrap();
    assert_eq!(sql, "SELECT * FROM users WHERE active = $1 AND age > $2");
    assert_eq!(params, vec![Value::Bool(true), Value::Int(18)]);
}

#[test]
fn test_in_list_expands_placeholders() {
    let qb = QueryBuilder::new("users")
        .select()
        .where_("id", Operator::In, vec![1, 2, 3]);

    let (sql, params) = qb.build_query().unwrap();
    assert_eq!(sql, "SELECT * FROM users WHERE id IN ($1, $2, $3)");
    assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_where_in_helper_matches_operator_form() {
    let a = QueryBuilder::new("users").select().where_in("id", [1, 2, 3]);
    let b = QueryBuilder::new("users")
        .select()
        .where_("id", "IN", vec![1, 2, 3]);
    assert_eq!(a.build_query().unwrap(), b.build_query().unwrap());
}

#[test]
fn test_insert_in_payload_order() {
    let qb = QueryBuilder::new("t").insert([
        ("name", Value::from("A")),
        ("active", Value::from(true)),
    ]);

    let (sql, params) = qb.build_query().unwrap();
    assert_eq!(sql, "INSERT INTO t (name, active) VALUES ($1, $2)");
    assert_eq!(params, vec![Value::Text("A".into()), Value::Bool(true)]);
}

#[test]
fn test_flat_predicate_chain() {
    let qb = QueryBuilder::new("flights")
        .select()
        .where_eq("origin", "LAX")
        .and_where("status", "=", "boarding")
        .or_where("priority", ">", 3);

    let (sql, params) = qb.build_query().unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM flights WHERE origin = $1 AND status = $2 OR priority > $3"
    );
    assert_eq!(params.len(), 3);
}

#[test]
fn test_first_predicate_ignores_or_flag() {
    let qb = QueryBuilder::new("flights")
        .select()
        .or_where("origin", "=", "LAX")
        .where_null("cancelled_at");

    let (sql, params) = qb.build_query().unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM flights WHERE origin = $1 AND cancelled_at IS NULL"
    );
    assert_eq!(params, vec![Value::from("LAX")]);
}

#[test]
fn test_compile_is_idempotent() {
    let qb = QueryBuilder::new("tickets")
        .select()
        .columns(["id", "seat"])
        .left_join("flights", "flights.id = tickets.flight_id")
        .where_("flights.origin", "IN", ["LAX", "SFO"])
        .where_not_null("seat")
        .group_by(["id", "seat"])
        .having("COUNT(*)", ">=", 1)
        .order_by("seat", Direction::Desc)
        .limit(20)
        .offset(40);

    let first = qb.build_query().unwrap();
    let second = qb.build_query().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_select_clause_order() {
    let qb = QueryBuilder::new("tickets")
        .offset(40)
        .limit(20)
        .order_by("seat", Direction::Asc)
        .having("COUNT(*)", ">", 1)
        .group_by(["seat"])
        .where_eq("class", "economy")
        .join_with(JoinKind::Inner, "flights", Some("f"), "f.id = tickets.flight_id")
        .columns(["seat", "COUNT(*)"])
        .select();

    let (sql, params) = qb.build_query().unwrap();
    assert_eq!(
        sql,
        "SELECT seat, COUNT(*) FROM tickets \
         INNER JOIN flights AS f ON f.id = tickets.flight_id \
         WHERE class = $1 GROUP BY seat HAVING COUNT(*) > $2 \
         ORDER BY seat ASC LIMIT 20 OFFSET 40"
    );
    assert_eq!(params, vec![Value::from("economy"), Value::Int(1)]);
}

#[test]
fn test_joins_render_for_select_only() {
    let qb = QueryBuilder::new("tickets")
        .join("flights", "flights.id = tickets.flight_id")
        .where_eq("flights.id", 9)
        .delete();

    let (sql, _) = qb.build_query().unwrap();
    assert_eq!(sql, "DELETE FROM tickets WHERE flights.id = $1");
}

#[test]
fn test_update_statement() {
    let qb = QueryBuilder::new("t")
        .update([("a", Value::Int(1)), ("b", Value::Null)])
        .where_eq("id", 5);

    let (sql, params) = qb.build_query().unwrap();
    assert_eq!(sql, "UPDATE t SET a = $1, b = $2 WHERE id = $3");
    assert_eq!(params, vec![Value::Int(1), Value::Null, Value::Int(5)]);
}

#[test]
fn test_no_statement_kind_is_compile_error() {
    let qb = QueryBuilder::new("users").where_eq("id", 1);
    assert!(matches!(qb.build_query(), Err(DbError::Compile { .. })));
}

#[test]
fn test_get_one_always_limits_to_one() {
    let unlimited = QueryBuilder::new("users").select();
    let (sql, _) = unlimited.one_query().unwrap();
    assert!(sql.ends_with(" LIMIT 1"));

    let limited = QueryBuilder::new("users").select().limit(100);
    let (sql, _) = limited.one_query().unwrap();
    assert!(sql.ends_with(" LIMIT 1"));
    assert!(!sql.contains("100"));
}

#[test]
fn test_count_leaves_projection_on_success_and_error() {
    let qb = QueryBuilder::new("users").select().columns(["id", "name"]);
    let (sql, _) = qb.count_query().unwrap();
    assert_eq!(sql, "SELECT COUNT(*) AS count FROM users");
    assert_eq!(qb.descriptor().columns, vec!["id", "name"]);

    // Unset kind fails to compile; the projection is still untouched
    let broken = QueryBuilder::new("users").columns(["id"]);
    assert!(broken.count_query().is_err());
    assert_eq!(broken.descriptor().columns, vec!["id"]);
}

#[test]
fn test_null_operators_bind_nothing() {
    let qb = QueryBuilder::new("t")
        .select()
        .where_("a", Operator::IsNull, Operand::None)
        .or_where("b", "is not null", Operand::None);

    let (sql, params) = qb.build_query().unwrap();
    assert_eq!(sql, "SELECT * FROM t WHERE a IS NULL OR b IS NOT NULL");
    assert!(params.is_empty());
}

#[test]
fn test_first_invalid_operator_is_reported() {
    let qb = QueryBuilder::new("t")
        .select()
        .where_("a", "~~", 1)
        .having("b", "BETWEEN", 2);

    let err = qb.build_query().unwrap_err();
    assert!(err.to_string().contains("~~"));
}
