//! Accumulated clause state of one statement
//!
//! The builder mutates a `ClauseSet`; the processor reads it. Everything is
//! kept in call order.

use crate::query_builder::aggregation::{AggregateFunction, SelectField};
use crate::query_builder::filter::WhereClause;
use crate::query_builder::insert::{align_rows, InsertRow};
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::OrderClause;
use crate::query_builder::pagination::Pagination;
use crate::query_builder::update::UpdateSet;
use type_mapping::Value;

/// Clause family whose bound values can be inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    From,
    Select,
    Join,
    Where,
    Order,
    Limit,
    Update,
    Insert,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClauseSet {
    pub from: Option<String>,
    pub columns: Vec<SelectField>,
    pub joins: Vec<JoinClause>,
    pub wheres: Vec<WhereClause>,
    pub orders: Vec<OrderClause>,
    pub pagination: Pagination,
    pub sets: UpdateSet,
    pub insert_rows: Vec<InsertRow>,
}

impl Default for ClauseSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseSet {
    pub fn new() -> Self {
        Self {
            from: None,
            columns: vec![SelectField::All],
            joins: Vec::new(),
            wheres: Vec::new(),
            orders: Vec::new(),
            pagination: Pagination::new(),
            sets: UpdateSet::new(),
            insert_rows: Vec::new(),
        }
    }

    /// Values bound by one clause family, in placeholder order
    pub fn bindings(&self, kind: BindingKind) -> Vec<Value> {
        match kind {
            BindingKind::Where => self
                .wheres
                .iter()
                .flat_map(|clause| clause.kind.values())
                .cloned()
                .collect(),
            BindingKind::Update => self.sets.values().cloned().collect(),
            BindingKind::Insert => self.insert_groups().into_iter().flatten().collect(),
            BindingKind::Limit => [self.pagination.limit, self.pagination.offset]
                .into_iter()
                .flatten()
                .map(|n| Value::Integer(i64::try_from(n).unwrap_or(i64::MAX)))
                .collect(),
            BindingKind::From | BindingKind::Select | BindingKind::Join | BindingKind::Order => {
                Vec::new()
            }
        }
    }

    /// Insert values grouped per row, in the column order the statement binds.
    /// Rows that cannot be aligned to the first row keep their own order.
    pub fn insert_groups(&self) -> Vec<Vec<Value>> {
        match align_rows(&self.insert_rows) {
            Ok((_, rows)) => rows
                .into_iter()
                .map(|row| row.into_iter().cloned().collect())
                .collect(),
            Err(_) => self
                .insert_rows
                .iter()
                .map(|row| row.values.iter().map(|(_, value)| value.clone()).collect())
                .collect(),
        }
    }

    /// Copy of this state projecting a single aggregate, with ordering dropped
    pub fn for_aggregate(&self, function: AggregateFunction, column: &str) -> Self {
        let mut clauses = self.clone();
        clauses.orders.clear();
        clauses.columns = vec![SelectField::aggregate(function, column)];
        clauses
    }
}
