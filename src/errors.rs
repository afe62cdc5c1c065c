//! Error types for the ezdb crate
//!
//! `EzdbError` wraps every subsystem error so callers can use one `?` type.

use thiserror::Error;

pub use config::ConfigError;
pub use query_object::{ConnectionError, DriverError, ModelMethodError, QueryError};

#[derive(Error, Debug)]
pub enum EzdbError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Model(#[from] ModelMethodError),

    #[error(transparent)]
    Driver(#[from] DriverError),
}
