//! # ezdb
//!
//! A fluent SQL query builder and relationship resolver over MySQL,
//! PostgreSQL and SQLite.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ezdb::prelude::*;
//!
//! fn main() -> Result<(), EzdbError> {
//!     let shared = Connections::add_connection(DatabaseConfig::sqlite(":memory:"), "main")?;
//!     let mut connection = shared.lock().unwrap();
//!
//!     connection.raw("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")?;
//!     connection.table("test").insert_many([[("name", "A")], [("name", "B")]])?;
//!
//!     let rows = connection
//!         .table("test")
//!         .where_("id", ">", 1)?
//!         .order_by("id", SortOrder::Desc)
//!         .get()?;
//!     println!("{}", serde_json::to_string(&rows).unwrap());
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::{Connections, SharedConnection};
pub use errors::EzdbError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, Dialect, DriverKind};

// Re-export internal crates
pub use config;
pub use query_object;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use sqlx;
