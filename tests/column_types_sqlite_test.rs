//! Integration tests for boolean, datetime and decimal columns on SQLite

use ezdb::prelude::*;
use pretty_assertions::assert_eq;

const FIXTURES: &str = "
    CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT);
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER,
        paid BOOLEAN,
        placed_at DATETIME,
        total DECIMAL(10, 2)
    );
    INSERT INTO customers (id, name) VALUES (1, 'Ada');
";

fn connection() -> Connection {
    let mut connection =
        Connection::new(DatabaseConfig::sqlite(":memory:")).expect("valid sqlite config");
    connection.raw(FIXTURES).expect("load fixtures");
    connection
        .table("orders")
        .insert_many([
            [
                ("customer_id", Value::from(1)),
                ("paid", Value::from(true)),
                ("placed_at", Value::from("2024-03-01 09:15:00")),
                ("total", Value::from(2.5)),
            ],
            [
                ("customer_id", Value::from(1)),
                ("paid", Value::from(false)),
                ("placed_at", Value::from("2024-03-02 18:40:00")),
                ("total", Value::from(7.5)),
            ],
        ])
        .expect("seed orders");
    connection
}

#[test]
fn test_get_decodes_typed_columns() {
    let mut connection = connection();

    let rows = connection
        .table("orders")
        .order_by("id", SortOrder::Asc)
        .get()
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("paid"), Some(&Value::Boolean(true)));
    assert_eq!(rows[1].get("paid"), Some(&Value::Boolean(false)));
    assert_eq!(
        rows[0].get("placed_at"),
        Some(&Value::Text("2024-03-01 09:15:00".to_string()))
    );
    assert_eq!(rows[1].get("total"), Some(&Value::Float(7.5)));
    assert_eq!(connection.last_insert_id(), Some(2));
}

#[test]
fn test_first_and_projection_over_typed_columns() {
    let mut connection = connection();

    let row = connection
        .table("orders")
        .where_eq("paid", false)
        .first()
        .unwrap()
        .expect("unpaid order");
    assert_eq!(row.get("id"), Some(&Value::Integer(2)));
    assert_eq!(row.get("paid"), Some(&Value::Boolean(false)));

    let row = connection
        .table("orders")
        .order_by("placed_at", SortOrder::Desc)
        .first_with(["placed_at", "paid"])
        .unwrap()
        .expect("latest order");
    assert_eq!(row.columns().collect::<Vec<_>>(), vec!["placed_at", "paid"]);
    assert_eq!(
        row.get("placed_at"),
        Some(&Value::Text("2024-03-02 18:40:00".to_string()))
    );

    let rows = connection.table("orders").select(["placed_at"]).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_aggregates_over_decimal_column() {
    let mut connection = connection();

    assert_eq!(connection.table("orders").avg("total").unwrap(), Value::Float(5.0));
    assert_eq!(connection.table("orders").max("total").unwrap(), Value::Float(7.5));
    assert_eq!(
        connection
            .table("orders")
            .where_eq("paid", true)
            .count()
            .unwrap(),
        1
    );
}

#[test]
fn test_relations_over_typed_columns() {
    let mut connection = connection();

    let orders = connection
        .relationships()
        .has_many("orders", 1, "customer_id")
        .get()
        .unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].get("paid"), Some(&Value::Boolean(true)));
    assert_eq!(
        orders[1].get("placed_at"),
        Some(&Value::Text("2024-03-02 18:40:00".to_string()))
    );

    let mut order = orders[0].clone();
    connection
        .relationships()
        .belongs_to("customers", 1, "id")
        .load_into(&mut order)
        .unwrap();
    match order.relation("customers") {
        Some(Related::One(Some(customer))) => {
            assert_eq!(customer.get("name"), Some(&Value::from("Ada")));
        }
        other => panic!("unexpected relation: {:?}", other),
    }
}
