//! Blocking driver over sqlx's native MySQL, PostgreSQL and SQLite connections.
//!
//! Each driver owns a current-thread tokio runtime and blocks on it for every
//! call. It must not be used from inside another tokio runtime.
//!
//! Cells are decoded from the backend's own type information. Decimal,
//! date/time, uuid and json columns come back as `Value::Text`.

use super::{escape_literal, returns_rows, Driver, ExecOutcome, RawRow, Statement};
use crate::debug_log;
use crate::errors::{ConnectionError, DriverError};
use config::{DatabaseConfig, Dialect, DriverKind};
use sqlx::mysql::{MySqlConnection, MySqlQueryResult, MySqlRow};
use sqlx::postgres::{PgConnection, PgQueryResult, PgRow, PgValueFormat};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteConnection, SqliteQueryResult, SqliteRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{
    Column, ColumnIndex, Connection, Database, Decode, Encode, Executor, Row, Type, TypeInfo,
    ValueRef,
};
use tokio::runtime::Runtime;
use type_mapping::{Value, WireType};

/// An open handle on one of the supported backends
enum Handle {
    MySql(MySqlConnection),
    Postgres(PgConnection),
    Sqlite(SqliteConnection),
}

/// Expand `$body` once per backend with `$conn` bound to the native
/// connection and, in the second form, `$db` naming the database type
macro_rules! on_handle {
    ($handle:expr, $conn:ident => $body:expr) => {
        match $handle {
            Handle::MySql($conn) => $body,
            Handle::Postgres($conn) => $body,
            Handle::Sqlite($conn) => $body,
        }
    };
    ($handle:expr, $conn:ident, $db:ident => $body:expr) => {
        match $handle {
            Handle::MySql($conn) => {
                type $db = sqlx::MySql;
                $body
            }
            Handle::Postgres($conn) => {
                type $db = sqlx::Postgres;
                $body
            }
            Handle::Sqlite($conn) => {
                type $db = sqlx::Sqlite;
                $body
            }
        }
    };
}

pub struct SqlxDriver {
    kind: DriverKind,
    dialect: Dialect,
    url: String,
    // declared before the runtime so it is dropped first
    connection: Option<Handle>,
    runtime: Runtime,
    last_insert_id: Option<i64>,
}

impl SqlxDriver {
    pub fn new(config: &DatabaseConfig) -> Result<Self, ConnectionError> {
        let url = config.connection_url()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ConnectionError::ConnectFailed(DriverError::new(e.to_string())))?;

        Ok(Self {
            kind: config.driver(),
            dialect: config.driver().dialect(),
            url,
            connection: None,
            runtime,
            last_insert_id: None,
        })
    }

    fn not_connected() -> DriverError {
        DriverError::new("no open database handle")
    }

    fn record_insert_id(&mut self, id: Option<i64>) {
        if id.is_some() {
            self.last_insert_id = id;
        }
    }
}

impl Driver for SqlxDriver {
    fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn connect(&mut self) -> Result<(), DriverError> {
        debug_log!("Opening {} connection", self.kind);
        let url = self.url.as_str();
        let handle = match self.kind {
            DriverKind::Mysql | DriverKind::Mysqli => {
                Handle::MySql(self.runtime.block_on(MySqlConnection::connect(url))?)
            }
            DriverKind::Pgsql => {
                Handle::Postgres(self.runtime.block_on(PgConnection::connect(url))?)
            }
            DriverKind::Sqlite => {
                Handle::Sqlite(self.runtime.block_on(SqliteConnection::connect(url))?)
            }
        };
        self.connection = Some(handle);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn prepare(&mut self, sql: &str) -> Result<Statement, DriverError> {
        let handle = self.connection.as_mut().ok_or_else(Self::not_connected)?;
        on_handle!(handle, conn => {
            self.runtime.block_on(conn.prepare(sql))?;
        });
        Ok(Statement::new(sql))
    }

    fn execute(&mut self, statement: Statement, fetch: bool) -> Result<ExecOutcome, DriverError> {
        let handle = self.connection.as_mut().ok_or_else(Self::not_connected)?;
        let runtime = &self.runtime;

        let (outcome, insert_id) = on_handle!(handle, conn, DB => {
            let query = build_query(sqlx::query::<DB>(statement.sql()), &statement);
            if fetch {
                let rows = runtime.block_on(query.fetch_all(&mut *conn))?;
                let rows = rows.iter().map(DecodeRow::decode_row).collect::<Result<Vec<_>, _>>()?;
                (ExecOutcome::Rows(rows), None)
            } else {
                let result = runtime.block_on(query.execute(&mut *conn))?;
                (ExecOutcome::Affected(result.rows_affected()), result.insert_id())
            }
        });

        self.record_insert_id(insert_id);
        Ok(outcome)
    }

    fn query(&mut self, sql: &str) -> Result<ExecOutcome, DriverError> {
        let handle = self.connection.as_mut().ok_or_else(Self::not_connected)?;
        let runtime = &self.runtime;

        let (outcome, insert_id) = on_handle!(handle, conn => {
            if returns_rows(sql) {
                let rows = runtime.block_on(sqlx::raw_sql(sql).fetch_all(&mut *conn))?;
                let rows = rows.iter().map(DecodeRow::decode_row).collect::<Result<Vec<_>, _>>()?;
                (ExecOutcome::Rows(rows), None)
            } else {
                let result = runtime.block_on(sqlx::raw_sql(sql).execute(&mut *conn))?;
                (ExecOutcome::Affected(result.rows_affected()), result.insert_id())
            }
        });

        self.record_insert_id(insert_id);
        Ok(outcome)
    }

    fn escape(&self, value: &str) -> String {
        escape_literal(self.dialect, value)
    }

    /// Id generated by the last insert. MySQL and SQLite report it natively;
    /// PostgreSQL has no connection-level insert id, so it stays `None` there.
    fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    fn reset(&mut self) -> bool {
        self.close();
        match self.connect() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Failed to reopen {} connection: {}", self.kind, err);
                false
            }
        }
    }

    fn close(&mut self) -> bool {
        match self.connection.take() {
            Some(handle) => {
                debug_log!("Closing {} connection", self.kind);
                on_handle!(handle, conn => self.runtime.block_on(conn.close()).is_ok())
            }
            None => false,
        }
    }
}

impl Drop for SqlxDriver {
    fn drop(&mut self) {
        self.close();
    }
}

type BoundQuery<'q, DB> = Query<'q, DB, <DB as Database>::Arguments<'q>>;

fn build_query<'q, DB>(query: BoundQuery<'q, DB>, statement: &'q Statement) -> BoundQuery<'q, DB>
where
    DB: Database,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    bool: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
{
    statement
        .bindings()
        .iter()
        .fold(query, |query, (value, wire_type)| bind_value(query, value, *wire_type))
}

fn bind_value<'q, DB>(
    query: BoundQuery<'q, DB>,
    value: &Value,
    wire_type: WireType,
) -> BoundQuery<'q, DB>
where
    DB: Database,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    bool: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
{
    if value.is_null() {
        return query.bind(None::<String>);
    }
    match wire_type {
        WireType::Integer => match value.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(value.to_string()),
        },
        WireType::Float => match value.as_f64() {
            Some(f) => query.bind(f),
            None => query.bind(value.to_string()),
        },
        WireType::Boolean => match value.as_bool() {
            Some(b) => query.bind(b),
            None => query.bind(value.to_string()),
        },
        WireType::Text => query.bind(value.to_string()),
    }
}

/// Native insert id of an executed statement
trait InsertId {
    fn insert_id(&self) -> Option<i64>;
}

impl InsertId for MySqlQueryResult {
    fn insert_id(&self) -> Option<i64> {
        match self.last_insert_id() {
            0 => None,
            id => i64::try_from(id).ok(),
        }
    }
}

impl InsertId for SqliteQueryResult {
    fn insert_id(&self) -> Option<i64> {
        match self.last_insert_rowid() {
            0 => None,
            id => Some(id),
        }
    }
}

impl InsertId for PgQueryResult {
    fn insert_id(&self) -> Option<i64> {
        None
    }
}

/// Conversion of a backend row into ordered `(column, value)` cells
trait DecodeRow: Row {
    fn decode_cell(&self, index: usize) -> Result<Value, DriverError>;

    fn decode_row(&self) -> Result<RawRow, DriverError> {
        self.columns()
            .iter()
            .map(|column| {
                let value = self.decode_cell(column.ordinal())?;
                Ok((column.name().to_string(), value))
            })
            .collect()
    }
}

fn cell<'r, R, T>(row: &'r R, index: usize) -> Result<T, DriverError>
where
    R: Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database> + Type<R::Database>,
{
    Ok(row.try_get(index)?)
}

fn text(value: impl ToString) -> Value {
    Value::Text(value.to_string())
}

fn lossy(bytes: Vec<u8>) -> Value {
    Value::Text(String::from_utf8_lossy(&bytes).into_owned())
}

/// Unsigned integers that do not fit an `i64` are kept as text
fn unsigned(value: u64) -> Value {
    match i64::try_from(value) {
        Ok(i) => Value::Integer(i),
        Err(_) => text(value),
    }
}

impl DecodeRow for MySqlRow {
    fn decode_cell(&self, index: usize) -> Result<Value, DriverError> {
        let raw = self.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let type_info = raw.type_info().into_owned();

        let value = match type_info.name() {
            "BOOLEAN" => Value::Boolean(cell(self, index)?),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                Value::Integer(cell(self, index)?)
            }
            "YEAR" | "BIT" => match cell::<_, u64>(self, index) {
                Ok(v) => unsigned(v),
                Err(_) => Value::Integer(cell(self, index)?),
            },
            name if name.ends_with(" UNSIGNED") => unsigned(cell(self, index)?),
            "FLOAT" | "DOUBLE" => Value::Float(cell(self, index)?),
            "DECIMAL" => text(cell::<_, Decimal>(self, index)?),
            "DATE" => text(cell::<_, NaiveDate>(self, index)?),
            "TIME" => text(cell::<_, sqlx::mysql::types::MySqlTime>(self, index)?),
            "DATETIME" | "TIMESTAMP" => text(cell::<_, NaiveDateTime>(self, index)?),
            "JSON" => text(cell::<_, JsonValue>(self, index)?),
            _ => match cell::<_, String>(self, index) {
                Ok(s) => Value::Text(s),
                Err(_) => lossy(cell(self, index)?),
            },
        };
        Ok(value)
    }
}

impl DecodeRow for PgRow {
    fn decode_cell(&self, index: usize) -> Result<Value, DriverError> {
        let raw = self.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let type_info = raw.type_info().into_owned();

        let value = match type_info.name() {
            "BOOL" => Value::Boolean(cell(self, index)?),
            "INT2" => Value::Integer(cell::<_, i16>(self, index)?.into()),
            "INT4" => Value::Integer(cell::<_, i32>(self, index)?.into()),
            "INT8" => Value::Integer(cell(self, index)?),
            "FLOAT4" => Value::Float(cell::<_, f32>(self, index)?.into()),
            "FLOAT8" => Value::Float(cell(self, index)?),
            "NUMERIC" => text(cell::<_, Decimal>(self, index)?),
            "DATE" => text(cell::<_, NaiveDate>(self, index)?),
            "TIME" => text(cell::<_, NaiveTime>(self, index)?),
            "TIMESTAMP" => text(cell::<_, NaiveDateTime>(self, index)?),
            "TIMESTAMPTZ" => text(cell::<_, DateTime<Utc>>(self, index)?.to_rfc3339()),
            "UUID" => text(cell::<_, Uuid>(self, index)?),
            "JSON" | "JSONB" => text(cell::<_, JsonValue>(self, index)?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => Value::Text(cell(self, index)?),
            "BYTEA" => lossy(cell(self, index)?),
            name => match raw.format() {
                PgValueFormat::Text => Value::Text(
                    raw.as_str()
                        .map_err(|e| DriverError::new(e.to_string()))?
                        .to_string(),
                ),
                PgValueFormat::Binary => {
                    return Err(DriverError::new(format!(
                        "column {} has the unsupported type {}",
                        index, name
                    )))
                }
            },
        };
        Ok(value)
    }
}

impl DecodeRow for SqliteRow {
    fn decode_cell(&self, index: usize) -> Result<Value, DriverError> {
        let raw = self.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        // storage class of the value, not the declared column type
        let storage = raw.type_info().name().to_string();
        let declared_bool = self.column(index).type_info().name() == "BOOLEAN";

        let value = match storage.as_str() {
            "INTEGER" if declared_bool => Value::Boolean(cell(self, index)?),
            "INTEGER" => Value::Integer(cell(self, index)?),
            "REAL" => Value::Float(cell(self, index)?),
            "BLOB" => lossy(cell(self, index)?),
            _ => Value::Text(cell(self, index)?),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sqlite_driver() -> SqlxDriver {
        let mut driver = SqlxDriver::new(&DatabaseConfig::sqlite(":memory:")).expect("driver");
        driver.connect().expect("open in-memory database");
        driver
    }

    #[test]
    fn test_unsigned_overflow_becomes_text() {
        assert_eq!(unsigned(42), Value::Integer(42));
        assert_eq!(unsigned(u64::MAX), Value::Text(u64::MAX.to_string()));
    }

    #[test]
    fn test_sqlite_decodes_declared_types() {
        let mut driver = sqlite_driver();
        driver
            .query(
                "CREATE TABLE events (
                    id INTEGER PRIMARY KEY,
                    active BOOLEAN,
                    happened_on DATE,
                    created_at DATETIME,
                    price DECIMAL(10, 2),
                    payload BLOB,
                    note TEXT
                )",
            )
            .expect("create table");
        driver
            .query(
                "INSERT INTO events (active, happened_on, created_at, price, payload, note)
                 VALUES (1, '2024-01-02', '2024-01-02 10:30:00', 19.99, X'6869', NULL)",
            )
            .expect("insert");

        let rows = driver
            .query("SELECT active, happened_on, created_at, price, payload, note FROM events")
            .expect("select")
            .into_rows();

        assert_eq!(
            rows,
            vec![vec![
                ("active".to_string(), Value::Boolean(true)),
                ("happened_on".to_string(), Value::Text("2024-01-02".into())),
                ("created_at".to_string(), Value::Text("2024-01-02 10:30:00".into())),
                ("price".to_string(), Value::Float(19.99)),
                ("payload".to_string(), Value::Text("hi".into())),
                ("note".to_string(), Value::Null),
            ]]
        );
    }

    #[test]
    fn test_sqlite_insert_id_is_native_rowid() {
        let mut driver = sqlite_driver();
        driver
            .query("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")
            .expect("create table");
        assert_eq!(driver.last_insert_id(), None);

        let statement = driver.prepare("INSERT INTO t (name) VALUES (?)").expect("prepare");
        let statement = driver.bind(statement, vec![Value::from("a")]);
        driver.execute(statement, false).expect("insert");
        assert_eq!(driver.last_insert_id(), Some(1));

        driver.query("INSERT INTO t (name) VALUES ('b')").expect("raw insert");
        assert_eq!(driver.last_insert_id(), Some(2));

        // an update keeps the id of the last insert
        let statement = driver.prepare("UPDATE t SET name = ?").expect("prepare");
        let statement = driver.bind(statement, vec![Value::from("c")]);
        driver.execute(statement, false).expect("update");
        assert_eq!(driver.last_insert_id(), Some(2));
    }

    #[test]
    fn test_bound_boolean_reads_back() {
        let mut driver = sqlite_driver();
        driver.query("CREATE TABLE flags (on_off BOOLEAN)").expect("create table");

        let statement = driver.prepare("INSERT INTO flags (on_off) VALUES (?)").expect("prepare");
        let statement = driver.bind(statement, vec![Value::Boolean(false)]);
        driver.execute(statement, false).expect("insert");

        let rows = driver.query("SELECT on_off FROM flags").expect("select").into_rows();
        assert_eq!(rows, vec![vec![("on_off".to_string(), Value::Boolean(false))]]);
    }
}
