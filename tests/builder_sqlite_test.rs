//! Integration tests for the fluent builder
//!
//! Runs against an in-memory SQLite database through the sqlx driver.

use ezdb::prelude::*;
use pretty_assertions::assert_eq;

fn seeded_connection() -> Connection {
    let mut connection =
        Connection::new(DatabaseConfig::sqlite(":memory:")).expect("valid sqlite config");
    connection
        .raw(
            "CREATE TABLE test (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                score REAL,
                created_at TEXT
            )",
        )
        .expect("create table");
    connection
        .table("test")
        .insert_many([
            [("name", Value::from("A")), ("score", Value::from(1.5))],
            [("name", Value::from("B")), ("score", Value::from(2.5))],
            [("name", Value::from("C")), ("score", Value::from(3.5))],
        ])
        .expect("seed rows");
    connection
}

fn ids(rows: &[Row]) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get("id").cloned().unwrap_or_default())
        .collect()
}

#[test]
fn test_where_and_order_select() {
    let mut connection = seeded_connection();

    let rows = connection
        .table("test")
        .where_("id", ">", 1)
        .unwrap()
        .order_by("id", SortOrder::Desc)
        .get()
        .unwrap();

    assert_eq!(ids(&rows), vec![Value::from(3), Value::from(2)]);
    assert_eq!(rows[0].get("name"), Some(&Value::from("C")));
    assert_eq!(rows[1].get("name"), Some(&Value::from("B")));
}

#[test]
fn test_insert_round_trip() {
    let mut connection = seeded_connection();

    let inserted = connection
        .table("test")
        .insert([
            ("name", Value::from("ezDB")),
            ("score", Value::from(9.25)),
            ("created_at", Value::from("2024-01-01 00:00:00")),
        ])
        .unwrap();
    assert_eq!(inserted, 1);
    assert_eq!(connection.last_insert_id(), Some(4));

    let row = connection
        .table("test")
        .where_eq("name", "ezDB")
        .first()
        .unwrap()
        .expect("inserted row");
    assert_eq!(row.get("id"), Some(&Value::Integer(4)));
    assert_eq!(row.get("score"), Some(&Value::Float(9.25)));
    assert_eq!(row.get("created_at"), Some(&Value::from("2024-01-01 00:00:00")));
}

#[test]
fn test_projection_limits_columns() {
    let mut connection = seeded_connection();

    let rows = connection
        .table("test")
        .where_in("name", ["A", "C"])
        .unwrap()
        .select(["id", "name"])
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "name"]);
}

#[test]
fn test_aggregates_agree() {
    let mut connection = seeded_connection();
    let mut builder = connection.table("test");
    builder.where_not_null("name");

    let count = builder.count().unwrap();
    let sum = builder.sum("id").unwrap().as_f64().unwrap();
    let avg = builder.avg("id").unwrap().as_f64().unwrap();

    assert_eq!(count, 3);
    assert_eq!(sum / count as f64, avg);
    assert_eq!(builder.min("score").unwrap(), Value::Float(1.5));
    assert_eq!(builder.max("score").unwrap(), Value::Float(3.5));
    assert_eq!(builder.clauses().wheres.len(), 1);
    assert!(builder.clauses().orders.is_empty());
}

#[test]
fn test_between_or_and_pagination() {
    let mut connection = seeded_connection();

    let rows = connection
        .table("test")
        .where_between("id", [1, 2])
        .or_where("name", "=", "C")
        .unwrap()
        .order_by("id", SortOrder::Asc)
        .limit(2)
        .offset(1)
        .get()
        .unwrap();
    assert_eq!(ids(&rows), vec![Value::from(2), Value::from(3)]);

    let rows = connection
        .table("test")
        .where_not_between("id", [1, 2])
        .get()
        .unwrap();
    assert_eq!(ids(&rows), vec![Value::from(3)]);
}

#[test]
fn test_update_and_delete() {
    let mut connection = seeded_connection();

    let updated = connection
        .table("test")
        .where_("id", ">=", 2)
        .unwrap()
        .update([("created_at", "2024-06-01 12:00:00")])
        .unwrap();
    assert_eq!(updated, 2);

    let missing = connection
        .table("test")
        .where_null("created_at")
        .count()
        .unwrap();
    assert_eq!(missing, 1);

    let deleted = connection
        .table("test")
        .where_not_in("id", [1])
        .unwrap()
        .delete()
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(connection.table("test").count().unwrap(), 1);
}

#[test]
fn test_driver_errors_surface_as_query_errors() {
    let mut connection = seeded_connection();

    let err = connection.table("missing_table").get().unwrap_err();
    assert!(matches!(err, QueryError::Execution(_)));
    assert!(err.to_string().starts_with("Query error: execution failed"));

    let err = connection.table("test").where_("id", "<>>", 1).err().unwrap();
    assert!(matches!(err, QueryError::InvalidOperator(_)));
}
