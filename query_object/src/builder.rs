//! Fluent query builder
//!
//! Chained calls accumulate clauses on a `ClauseSet`; terminal operations
//! compile it through the connection's processor and execute it. Terminal
//! operations leave the clause state in place, so bindings stay inspectable.

use crate::connection::Connection;
use crate::driver::{ExecOutcome, RawRow};
use crate::errors::QueryError;
use crate::hydrate::Hydrator;
use crate::query_builder::{
    AggregateFunction, BindingKind, ClauseSet, CompiledQuery, InsertRow, JoinClause, JoinType,
    LogicalOperator, Operator, OrderClause, SelectField, SortOrder, StatementKind, WhereClause,
    WhereKind, AGGREGATE_ALIAS,
};
use crate::row::Row;
use type_mapping::Value;

pub struct Builder<'c> {
    connection: &'c mut Connection,
    clauses: ClauseSet,
}

impl<'c> Builder<'c> {
    pub fn new(connection: &'c mut Connection) -> Self {
        Self {
            connection,
            clauses: ClauseSet::new(),
        }
    }

    pub fn table(&mut self, name: &str) -> &mut Self {
        self.clauses.from = Some(name.to_string());
        self
    }

    /// Set the projection used by `get` and `first`
    pub fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clauses.columns = columns
            .into_iter()
            .map(|c| SelectField::field(c.as_ref()))
            .collect();
        self
    }

    /// Add a projected column under an alias
    pub fn column_as(&mut self, column: &str, alias: &str) -> &mut Self {
        self.clauses.columns.retain(|c| *c != SelectField::All);
        self.clauses.columns.push(SelectField::field_as(column, alias));
        self
    }

    // ========================================
    // WHERE family
    // ========================================

    fn push_where(&mut self, clause: WhereClause) -> &mut Self {
        self.clauses.wheres.push(clause);
        self
    }

    /// Add a basic comparison joined with an explicit connective
    pub fn where_with(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
        boolean: LogicalOperator,
    ) -> Result<&mut Self, QueryError> {
        let operator = operator.parse()?;
        Ok(self.push_where(WhereClause::basic(column, operator, value).with_boolean(boolean)))
    }

    pub fn where_(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, QueryError> {
        self.where_with(column, operator, value, LogicalOperator::And)
    }

    pub fn or_where(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, QueryError> {
        self.where_with(column, operator, value, LogicalOperator::Or)
    }

    /// `column = value`
    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_where(WhereClause::basic(column, Operator::Eq, value))
    }

    fn null_clause(&mut self, column: &str, not: bool, boolean: LogicalOperator) -> &mut Self {
        self.push_where(
            WhereClause::new(column, WhereKind::IsNull)
                .negated(not)
                .with_boolean(boolean),
        )
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.null_clause(column, false, LogicalOperator::And)
    }

    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.null_clause(column, false, LogicalOperator::Or)
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.null_clause(column, true, LogicalOperator::And)
    }

    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.null_clause(column, true, LogicalOperator::Or)
    }

    fn between_clause<V: Into<Value>>(
        &mut self,
        column: &str,
        [low, high]: [V; 2],
        not: bool,
        boolean: LogicalOperator,
    ) -> &mut Self {
        let kind = WhereKind::Between {
            low: low.into(),
            high: high.into(),
        };
        self.push_where(WhereClause::new(column, kind).negated(not).with_boolean(boolean))
    }

    pub fn where_between<V: Into<Value>>(&mut self, column: &str, range: [V; 2]) -> &mut Self {
        self.between_clause(column, range, false, LogicalOperator::And)
    }

    pub fn or_where_between<V: Into<Value>>(&mut self, column: &str, range: [V; 2]) -> &mut Self {
        self.between_clause(column, range, false, LogicalOperator::Or)
    }

    pub fn where_not_between<V: Into<Value>>(&mut self, column: &str, range: [V; 2]) -> &mut Self {
        self.between_clause(column, range, true, LogicalOperator::And)
    }

    pub fn or_where_not_between<V: Into<Value>>(&mut self, column: &str, range: [V; 2]) -> &mut Self {
        self.between_clause(column, range, true, LogicalOperator::Or)
    }

    fn in_clause<I, V>(
        &mut self,
        column: &str,
        values: I,
        not: bool,
        boolean: LogicalOperator,
    ) -> Result<&mut Self, QueryError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(QueryError::EmptyInList(column.to_string()));
        }
        Ok(self.push_where(
            WhereClause::new(column, WhereKind::In(values))
                .negated(not)
                .with_boolean(boolean),
        ))
    }

    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self, QueryError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_clause(column, values, false, LogicalOperator::And)
    }

    pub fn or_where_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self, QueryError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_clause(column, values, false, LogicalOperator::Or)
    }

    pub fn where_not_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self, QueryError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_clause(column, values, true, LogicalOperator::And)
    }

    pub fn or_where_not_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self, QueryError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_clause(column, values, true, LogicalOperator::Or)
    }

    // ========================================
    // Joins, ordering, pagination, SET
    // ========================================

    fn push_join(
        &mut self,
        join_type: JoinType,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> Result<&mut Self, QueryError> {
        let operator = operator.parse()?;
        self.clauses
            .joins
            .push(JoinClause::new_on(join_type, table, first, operator, second));
        Ok(self)
    }

    pub fn join(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> Result<&mut Self, QueryError> {
        self.push_join(JoinType::Inner, table, first, operator, second)
    }

    pub fn left_join(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> Result<&mut Self, QueryError> {
        self.push_join(JoinType::Left, table, first, operator, second)
    }

    pub fn order_by(&mut self, column: &str, direction: SortOrder) -> &mut Self {
        self.clauses.orders.push(OrderClause::new(column, direction));
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.clauses.pagination.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.clauses.pagination.offset = Some(offset);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.clauses.sets.set(column, value);
        self
    }

    // ========================================
    // Terminal operations
    // ========================================

    fn execute(&mut self, kind: StatementKind, clauses: &ClauseSet) -> Result<ExecOutcome, QueryError> {
        let compiled = self.connection.processor().compile(kind, clauses)?;
        self.connection.run(compiled, kind.fetches())
    }

    /// Run the SELECT and return the driver rows unhydrated
    pub(crate) fn fetch_raw(&mut self) -> Result<Vec<RawRow>, QueryError> {
        let clauses = self.clauses.clone();
        Ok(self.execute(StatementKind::Select, &clauses)?.into_rows())
    }

    /// Run the SELECT with the stored projection
    pub fn get(&mut self) -> Result<Vec<Row>, QueryError> {
        Ok(Hydrator::hydrate(self.fetch_raw()?))
    }

    /// Run the SELECT projecting `columns`
    pub fn select<I, S>(&mut self, columns: I) -> Result<Vec<Row>, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns(columns);
        self.get()
    }

    /// First matching row; the stored limit is left untouched
    pub fn first(&mut self) -> Result<Option<Row>, QueryError> {
        let mut clauses = self.clauses.clone();
        clauses.pagination.limit = Some(1);
        let rows = self.execute(StatementKind::Select, &clauses)?.into_rows();
        Ok(Hydrator::hydrate_one(rows))
    }

    /// `first` projecting `columns`
    pub fn first_with<I, S>(&mut self, columns: I) -> Result<Option<Row>, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns(columns);
        self.first()
    }

    /// Insert one row; returns the affected-row count
    pub fn insert<I, C, V>(&mut self, row: I) -> Result<u64, QueryError>
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Value>,
    {
        self.insert_many([row])
    }

    /// Insert several rows sharing one column set in a single statement
    pub fn insert_many<R, I, C, V>(&mut self, rows: R) -> Result<u64, QueryError>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Value>,
    {
        self.clauses.insert_rows = rows.into_iter().map(InsertRow::new).collect();
        let clauses = self.clauses.clone();
        Ok(self.execute(StatementKind::Insert, &clauses)?.affected())
    }

    /// Apply `values` as SET assignments and run the UPDATE
    pub fn update<I, C, V>(&mut self, values: I) -> Result<u64, QueryError>
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Value>,
    {
        for (column, value) in values {
            self.clauses.sets.set(column, value);
        }
        let clauses = self.clauses.clone();
        Ok(self.execute(StatementKind::Update, &clauses)?.affected())
    }

    pub fn delete(&mut self) -> Result<u64, QueryError> {
        let clauses = self.clauses.clone();
        Ok(self.execute(StatementKind::Delete, &clauses)?.affected())
    }

    // ========================================
    // Aggregates
    // ========================================

    /// Run `function(column)` on a copy of the clause state
    pub fn aggregate(&mut self, function: AggregateFunction, column: &str) -> Result<Value, QueryError> {
        let clauses = self.clauses.for_aggregate(function, column);
        let rows = self.execute(StatementKind::Select, &clauses)?.into_rows();
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| {
                row.into_iter()
                    .find(|(name, _)| name == AGGREGATE_ALIAS)
                    .map(|(_, value)| value)
            })
            .unwrap_or(Value::Null))
    }

    pub fn count(&mut self) -> Result<i64, QueryError> {
        let value = self.aggregate(AggregateFunction::Count, "*")?;
        Ok(value.as_i64().unwrap_or(0))
    }

    pub fn min(&mut self, column: &str) -> Result<Value, QueryError> {
        self.aggregate(AggregateFunction::Min, column)
    }

    pub fn max(&mut self, column: &str) -> Result<Value, QueryError> {
        self.aggregate(AggregateFunction::Max, column)
    }

    pub fn sum(&mut self, column: &str) -> Result<Value, QueryError> {
        self.aggregate(AggregateFunction::Sum, column)
    }

    pub fn avg(&mut self, column: &str) -> Result<Value, QueryError> {
        self.aggregate(AggregateFunction::Avg, column)
    }

    // ========================================
    // Introspection
    // ========================================

    /// Compile the SELECT without running it
    pub fn to_sql(&self) -> Result<CompiledQuery, QueryError> {
        self.connection.processor().compile_select(&self.clauses)
    }

    pub fn bindings(&self, kind: BindingKind) -> Vec<Value> {
        self.clauses.bindings(kind)
    }

    /// Pending insert values, one group per row
    pub fn insert_groups(&self) -> Vec<Vec<Value>> {
        self.clauses.insert_groups()
    }

    pub fn clauses(&self) -> &ClauseSet {
        &self.clauses
    }

    pub fn clauses_mut(&mut self) -> &mut ClauseSet {
        &mut self.clauses
    }

    pub fn connection(&mut self) -> &mut Connection {
        self.connection
    }
}
