//! Convenience re-exports for common ezdb usage
//!
//! # Example
//!
//! ```rust
//! use ezdb::prelude::*;
//! ```

// Registry and errors
pub use crate::core::{Connections, SharedConnection};
pub use crate::errors::EzdbError;

// Centralized config
pub use config::{AppConfig, DatabaseConfig, Dialect, DriverKind};

// Builders, relations and results
pub use query_object::prelude::*;
pub use query_object::relationship::{BelongsTo, BelongsToMany, HasMany, HasOne};

// Common external dependencies
pub use serde_json;
pub use type_mapping::Value;
