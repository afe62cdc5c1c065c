//! Convenience re-exports for common query-object usage

// Connections and builders
pub use crate::builder::Builder;
pub use crate::connection::Connection;
pub use crate::relationship::{Relation, RelationKind, RelationResult, RelationshipBuilder};

// Driver seam
pub use crate::driver::{Driver, ExecOutcome};

// Error types
pub use crate::errors::{ConnectionError, DriverError, ModelMethodError, QueryError};

// Clause vocabulary
pub use crate::query_builder::{BindingKind, LogicalOperator, Operator, SortOrder};

// Results
pub use crate::row::{Related, Row};

// Common external dependencies that are frequently used
pub use config::{DatabaseConfig, DriverKind};
pub use type_mapping::Value;
