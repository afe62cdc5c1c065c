use crate::relationship::RelationKind;
use crate::validation::ValidationError;
use config::ConfigError;
use std::fmt;
use thiserror::Error;

/// Low-level failure reported by a driver, with the database error code when one exists
#[derive(Debug, Clone, PartialEq)]
pub struct DriverError {
    pub message: String,
    pub code: Option<String>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "Driver error: [{}] {}", code, self.message),
            None => write!(f, "Driver error: {}", self.message),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<sqlx::Error> for DriverError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());
        let message = match err.as_database_error() {
            Some(db) => db.message().to_string(),
            None => err.to_string(),
        };
        Self { message, code }
    }
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Connection error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error: database connection could not be established: {0}")]
    ConnectFailed(DriverError),

    #[error("Connection error: no connection registered under `{0}`")]
    NotRegistered(String),

    #[error("Connection error: a connection is already registered under `{0}`")]
    AlreadyRegistered(String),
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query error: operator `{0}` is not supported")]
    InvalidOperator(String),

    #[error("Query error: no table selected")]
    MissingTable,

    #[error("Query error: whereIn on `{0}` needs at least one value")]
    EmptyInList(String),

    #[error("Query error: {0}")]
    InvalidIdentifier(#[from] ValidationError),

    #[error("Query error: {0}")]
    Unsupported(String),

    #[error("Query error: {modifier} is not supported on {relation} relations")]
    IncompatibleModifier {
        modifier: &'static str,
        relation: RelationKind,
    },

    #[error("Query error: execution failed: {0}")]
    Execution(#[from] DriverError),

    #[error("Query error: {0}")]
    Connection(#[from] ConnectionError),
}

/// A pivot-only modifier was called on a relation without a pivot table
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Model error: {method} can only be used on belongsToMany relations, not {relation}")]
pub struct ModelMethodError {
    pub method: &'static str,
    pub relation: RelationKind,
}
