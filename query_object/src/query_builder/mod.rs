//! Query builder utilities
//!
//! Clause model and SQL compiler. Nothing in here talks to a database.

pub mod aggregation;
pub mod clauses;
pub mod filter;
pub mod insert;
pub mod join;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;
pub mod update;


pub use aggregation::{AggregateFunction, SelectField, AGGREGATE_ALIAS};
pub use clauses::{BindingKind, ClauseSet};
pub use filter::{LogicalOperator, Operator, WhereClause, WhereKind};
pub use insert::InsertRow;
pub use join::{JoinClause, JoinCondition, JoinType};
pub use ordering::{OrderClause, SortOrder};
pub use pagination::Pagination;
pub use sql_generation::{CompiledQuery, Grammar, Processor, StatementKind};
pub use update::{SetClause, UpdateSet};
