//! SQL compiler
//!
//! Turns a `ClauseSet` into SQL text plus the ordered binding list. Every
//! placeholder is emitted at the moment its value is pushed, so the two can
//! never drift apart: INSERT or SET values first, then WHERE values in clause
//! order, then LIMIT and OFFSET.

use crate::errors::QueryError;
use crate::query_builder::aggregation::SelectField;
use crate::query_builder::clauses::ClauseSet;
use crate::query_builder::filter::{WhereClause, WhereKind};
use crate::query_builder::insert::align_rows;
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::OrderClause;
use crate::query_builder::pagination::Pagination;
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use config::Dialect;
use type_mapping::Value;

/// Largest row count MySQL accepts, used for OFFSET without LIMIT
const MYSQL_MAX_ROWS: &str = "18446744073709551615";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    /// Whether executing the statement returns rows
    pub fn fetches(&self) -> bool {
        matches!(self, StatementKind::Select)
    }
}

/// SQL text and the values for its placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

/// Placeholder and identifier quoting rules of one dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    dialect: Dialect,
}

impl Grammar {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Placeholder for the 1-based binding `position`
    pub fn placeholder(&self, position: usize) -> String {
        match self.dialect {
            Dialect::Postgres => format!("${}", position),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    fn quote(&self, segment: &str) -> String {
        if segment == "*" {
            return segment.to_string();
        }
        match self.dialect {
            Dialect::MySql => format!("`{}`", segment),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", segment),
        }
    }

    pub fn wrap_table(&self, name: &str) -> Result<String, QueryError> {
        let table = ValidatedTableName::new(name)?;
        Ok(table.segments().map(|s| self.quote(s)).collect::<Vec<_>>().join("."))
    }

    pub fn wrap_column(&self, name: &str) -> Result<String, QueryError> {
        let column = ValidatedFieldName::new(name)?;
        Ok(column.segments().map(|s| self.quote(s)).collect::<Vec<_>>().join("."))
    }

    pub fn wrap_alias(&self, name: &str) -> Result<String, QueryError> {
        let alias = ValidatedFieldName::alias(name)?;
        Ok(self.quote(alias.as_str()))
    }
}

/// Collects bound values and hands out their placeholders
struct BindingStream<'g> {
    grammar: &'g Grammar,
    values: Vec<Value>,
}

impl<'g> BindingStream<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            values: Vec::new(),
        }
    }

    fn push(&mut self, value: &Value) -> String {
        self.values.push(value.clone());
        self.grammar.placeholder(self.values.len())
    }

    fn push_count(&mut self, n: u64) -> String {
        self.push(&Value::Integer(i64::try_from(n).unwrap_or(i64::MAX)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Processor {
    grammar: Grammar,
}

impl Processor {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            grammar: Grammar::new(dialect),
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn compile(
        &self,
        kind: StatementKind,
        clauses: &ClauseSet,
    ) -> Result<CompiledQuery, QueryError> {
        match kind {
            StatementKind::Select => self.compile_select(clauses),
            StatementKind::Insert => self.compile_insert(clauses),
            StatementKind::Update => self.compile_update(clauses),
            StatementKind::Delete => self.compile_delete(clauses),
        }
    }

    pub fn compile_select(&self, clauses: &ClauseSet) -> Result<CompiledQuery, QueryError> {
        let table = self.build_table(clauses)?;
        let mut stream = BindingStream::new(&self.grammar);

        let parts = vec![
            format!("SELECT {}", self.build_select_clause(&clauses.columns)?),
            format!("FROM {}", table),
            self.build_join_clause(&clauses.joins)?,
            self.build_where_clause(&clauses.wheres, &mut stream)?,
            self.build_order_clause(&clauses.orders)?,
            self.build_limit_clause(&clauses.pagination, &mut stream),
        ];

        Ok(Self::finish(parts, stream))
    }

    pub fn compile_insert(&self, clauses: &ClauseSet) -> Result<CompiledQuery, QueryError> {
        let table = self.build_table(clauses)?;
        let (columns, rows) = align_rows(&clauses.insert_rows)?;
        let mut stream = BindingStream::new(&self.grammar);

        let column_list = columns
            .iter()
            .map(|column| self.grammar.wrap_column(column))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");

        let values_list = rows
            .iter()
            .map(|row| {
                let placeholders: Vec<String> = row.iter().map(|value| stream.push(value)).collect();
                format!("({})", placeholders.join(", "))
            })
            .collect::<Vec<_>>()
            .join(", ");

        let parts = vec![format!(
            "INSERT INTO {} ({}) VALUES {}",
            table, column_list, values_list
        )];
        Ok(Self::finish(parts, stream))
    }

    pub fn compile_update(&self, clauses: &ClauseSet) -> Result<CompiledQuery, QueryError> {
        let table = self.build_table(clauses)?;
        if clauses.sets.is_empty() {
            return Err(QueryError::Unsupported(
                "update needs at least one column to set".to_string(),
            ));
        }
        self.check_mutation_clauses("update", clauses)?;

        let mut stream = BindingStream::new(&self.grammar);
        let assignments = clauses
            .sets
            .operations
            .iter()
            .map(|op| {
                let column = self.grammar.wrap_column(&op.column)?;
                Ok(format!("{} = {}", column, stream.push(&op.value)))
            })
            .collect::<Result<Vec<_>, QueryError>>()?
            .join(", ");

        let parts = vec![
            format!("UPDATE {} SET {}", table, assignments),
            self.build_where_clause(&clauses.wheres, &mut stream)?,
            self.build_order_clause(&clauses.orders)?,
            self.build_limit_clause(&clauses.pagination, &mut stream),
        ];
        Ok(Self::finish(parts, stream))
    }

    pub fn compile_delete(&self, clauses: &ClauseSet) -> Result<CompiledQuery, QueryError> {
        let table = self.build_table(clauses)?;
        self.check_mutation_clauses("delete", clauses)?;

        let mut stream = BindingStream::new(&self.grammar);
        let parts = vec![
            format!("DELETE FROM {}", table),
            self.build_where_clause(&clauses.wheres, &mut stream)?,
            self.build_order_clause(&clauses.orders)?,
            self.build_limit_clause(&clauses.pagination, &mut stream),
        ];
        Ok(Self::finish(parts, stream))
    }

    fn finish(parts: Vec<String>, stream: BindingStream<'_>) -> CompiledQuery {
        let sql = parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        CompiledQuery {
            sql,
            bindings: stream.values,
        }
    }

    fn build_table(&self, clauses: &ClauseSet) -> Result<String, QueryError> {
        let table = clauses.from.as_deref().ok_or(QueryError::MissingTable)?;
        self.grammar.wrap_table(table)
    }

    /// UPDATE and DELETE only take joins, ordering and limits where the dialect allows them
    fn check_mutation_clauses(&self, statement: &str, clauses: &ClauseSet) -> Result<(), QueryError> {
        if !clauses.joins.is_empty() {
            return Err(QueryError::Unsupported(format!(
                "joins cannot be used with {}",
                statement
            )));
        }
        let ordered_or_limited = !clauses.orders.is_empty() || clauses.pagination.limit.is_some();
        match self.grammar.dialect() {
            Dialect::MySql => {
                if clauses.pagination.offset.is_some() {
                    return Err(QueryError::Unsupported(format!(
                        "offset cannot be used with {}",
                        statement
                    )));
                }
            }
            Dialect::Postgres | Dialect::Sqlite => {
                if ordered_or_limited || clauses.pagination.offset.is_some() {
                    return Err(QueryError::Unsupported(format!(
                        "order by, limit and offset cannot be used with {} on {}",
                        statement,
                        self.grammar.dialect().as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    fn build_select_clause(&self, fields: &[SelectField]) -> Result<String, QueryError> {
        if fields.is_empty() {
            return Err(QueryError::Unsupported("no columns selected".to_string()));
        }

        let field_parts = fields
            .iter()
            .map(|field| self.build_select_field(field))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(field_parts.join(", "))
    }

    fn build_select_field(&self, field: &SelectField) -> Result<String, QueryError> {
        match field {
            SelectField::All => Ok("*".to_string()),
            SelectField::Field(name) => self.grammar.wrap_column(name),
            SelectField::FieldWithAlias { field, alias } => Ok(format!(
                "{} AS {}",
                self.grammar.wrap_column(field)?,
                self.grammar.wrap_alias(alias)?
            )),
            SelectField::Aggregate {
                function,
                field,
                alias,
            } => {
                let field_part = match field {
                    Some(f) => self.grammar.wrap_column(f)?,
                    None => "*".to_string(),
                };
                let aggregate = format!("{}({})", function.to_sql(), field_part);
                match alias {
                    Some(alias) => Ok(format!("{} AS {}", aggregate, self.grammar.wrap_alias(alias)?)),
                    None => Ok(aggregate),
                }
            }
        }
    }

    fn build_join_clause(&self, joins: &[JoinClause]) -> Result<String, QueryError> {
        let parts = joins
            .iter()
            .map(|join| {
                Ok(format!(
                    "{} {} ON {} {} {}",
                    join.join_type.to_sql(),
                    self.grammar.wrap_table(&join.table)?,
                    self.grammar.wrap_column(&join.condition.first)?,
                    join.condition.operator.to_sql(),
                    self.grammar.wrap_column(&join.condition.second)?
                ))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;
        Ok(parts.join(" "))
    }

    fn build_where_clause(
        &self,
        wheres: &[WhereClause],
        stream: &mut BindingStream<'_>,
    ) -> Result<String, QueryError> {
        if wheres.is_empty() {
            return Ok(String::new());
        }

        let mut sql = String::from("WHERE ");
        for (index, clause) in wheres.iter().enumerate() {
            if index > 0 {
                sql.push(' ');
                sql.push_str(clause.boolean.to_sql());
                sql.push(' ');
            }
            sql.push_str(&self.build_single_condition_sql(clause, stream)?);
        }
        Ok(sql)
    }

    fn build_single_condition_sql(
        &self,
        clause: &WhereClause,
        stream: &mut BindingStream<'_>,
    ) -> Result<String, QueryError> {
        let column = self.grammar.wrap_column(&clause.column)?;
        let not = if clause.not { "NOT " } else { "" };

        let sql = match &clause.kind {
            WhereKind::Basic { operator, value } => {
                let condition = format!("{} {} {}", column, operator.to_sql(), stream.push(value));
                if clause.not {
                    format!("NOT ({})", condition)
                } else {
                    condition
                }
            }
            WhereKind::IsNull => format!("{} IS {}NULL", column, not),
            WhereKind::Between { low, high } => {
                let low = stream.push(low);
                let high = stream.push(high);
                format!("{} {}BETWEEN {} AND {}", column, not, low, high)
            }
            WhereKind::In(values) => {
                if values.is_empty() {
                    return Err(QueryError::EmptyInList(clause.column.clone()));
                }
                let placeholders: Vec<String> = values.iter().map(|v| stream.push(v)).collect();
                format!("{} {}IN ({})", column, not, placeholders.join(", "))
            }
        };
        Ok(sql)
    }

    fn build_order_clause(&self, orders: &[OrderClause]) -> Result<String, QueryError> {
        if orders.is_empty() {
            return Ok(String::new());
        }

        let order_items = orders
            .iter()
            .map(|order| {
                Ok(format!(
                    "{} {}",
                    self.grammar.wrap_column(&order.column)?,
                    order.direction.to_sql()
                ))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        Ok(format!("ORDER BY {}", order_items.join(", ")))
    }

    fn build_limit_clause(&self, pagination: &Pagination, stream: &mut BindingStream<'_>) -> String {
        match (pagination.limit, pagination.offset) {
            (None, None) => String::new(),
            (Some(limit), None) => format!("LIMIT {}", stream.push_count(limit)),
            (Some(limit), Some(offset)) => {
                let limit = stream.push_count(limit);
                let offset = stream.push_count(offset);
                format!("LIMIT {} OFFSET {}", limit, offset)
            }
            (None, Some(offset)) => {
                let offset = stream.push_count(offset);
                match self.grammar.dialect() {
                    Dialect::Postgres => format!("OFFSET {}", offset),
                    Dialect::MySql => format!("LIMIT {} OFFSET {}", MYSQL_MAX_ROWS, offset),
                    Dialect::Sqlite => format!("LIMIT -1 OFFSET {}", offset),
                }
            }
        }
    }
}
