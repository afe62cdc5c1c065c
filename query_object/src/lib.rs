//! Query Object - fluent SQL building, execution and relationship resolution
//!
//! This crate provides the clause model and SQL compiler, the driver
//! abstraction, connections, result hydration and the relationship resolver.

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

pub mod builder;
pub mod connection;
pub mod driver;
pub mod errors;
pub mod hydrate;
pub mod prelude;
pub mod query_builder;
pub mod relationship;
pub mod row;
pub mod validation;

pub use builder::Builder;
pub use connection::Connection;
pub use driver::{Driver, ExecOutcome, RawRow, SqlxDriver, Statement};
pub use errors::{ConnectionError, DriverError, ModelMethodError, QueryError};
pub use hydrate::{Hydrator, PivotProjection};
pub use query_builder::{BindingKind, ClauseSet, CompiledQuery, LogicalOperator, Operator, SortOrder};
pub use relationship::{
    BelongsTo, BelongsToMany, HasMany, HasOne, Relation, RelationKind, RelationResult,
    RelationshipBuilder,
};
pub use row::{Related, Row};
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};
