//! Driver contract
//!
//! A driver owns one database handle and executes compiled statements on
//! it. Everything above this module is synchronous; drivers block.

pub mod sqlx_driver;

#[cfg(test)]
pub(crate) mod mock;

use crate::errors::DriverError;
use config::Dialect;
use type_mapping::{Value, WireType};

pub use sqlx_driver::SqlxDriver;

/// Ordered `(column, value)` cells of one result row, as returned by a driver
pub type RawRow = Vec<(String, Value)>;

/// A prepared statement and its typed bindings
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    bindings: Vec<(Value, WireType)>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn bindings(&self) -> &[(Value, WireType)] {
        &self.bindings
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.bindings.iter().map(|(value, _)| value)
    }

    pub fn push(&mut self, value: Value, wire_type: WireType) {
        self.bindings.push((value, wire_type));
    }
}

/// Result of executing a statement
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    Rows(Vec<RawRow>),
    Affected(u64),
}

impl ExecOutcome {
    pub fn into_rows(self) -> Vec<RawRow> {
        match self {
            ExecOutcome::Rows(rows) => rows,
            ExecOutcome::Affected(_) => Vec::new(),
        }
    }

    /// Affected-row count; for fetched results, the number of rows
    pub fn affected(&self) -> u64 {
        match self {
            ExecOutcome::Rows(rows) => rows.len() as u64,
            ExecOutcome::Affected(n) => *n,
        }
    }
}

pub trait Driver: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn connect(&mut self) -> Result<(), DriverError>;

    fn is_connected(&self) -> bool;

    fn prepare(&mut self, sql: &str) -> Result<Statement, DriverError>;

    /// Attach values positionally, each with its inferred wire type
    fn bind(&self, mut statement: Statement, values: Vec<Value>) -> Statement {
        for value in values {
            let wire_type = value.wire_type();
            statement.push(value, wire_type);
        }
        statement
    }

    /// Run a bound statement; `fetch` selects between rows and an affected count
    fn execute(&mut self, statement: Statement, fetch: bool) -> Result<ExecOutcome, DriverError>;

    /// Run raw SQL without bindings
    fn query(&mut self, sql: &str) -> Result<ExecOutcome, DriverError>;

    /// Escape a string for inclusion inside a single-quoted SQL literal
    fn escape(&self, value: &str) -> String;

    fn last_insert_id(&self) -> Option<i64>;

    fn reset(&mut self) -> bool;

    fn close(&mut self) -> bool;
}

/// Literal escaping rules of a dialect. The result has no surrounding quotes.
pub fn escape_literal(dialect: Dialect, value: &str) -> String {
    match dialect {
        Dialect::MySql => {
            let mut escaped = String::with_capacity(value.len());
            for c in value.chars() {
                match c {
                    '\0' => escaped.push_str("\\0"),
                    '\n' => escaped.push_str("\\n"),
                    '\r' => escaped.push_str("\\r"),
                    '\x1a' => escaped.push_str("\\Z"),
                    '\\' | '\'' | '"' => {
                        escaped.push('\\');
                        escaped.push(c);
                    }
                    _ => escaped.push(c),
                }
            }
            escaped
        }
        Dialect::Postgres | Dialect::Sqlite => value.replace('\'', "''"),
    }
}

/// Whether raw SQL produces a result set
pub(crate) fn returns_rows(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        keyword.as_str(),
        "SELECT" | "WITH" | "SHOW" | "PRAGMA" | "EXPLAIN" | "DESCRIBE" | "DESC" | "VALUES"
    )
}
