//! Relationship resolver
//!
//! Each relation kind is its own type wrapping a scoped `Builder`. Pivot-only
//! modifiers exist only on `BelongsToMany`; the erased `Relation` sum checks
//! them at runtime instead.

use crate::builder::Builder;
use crate::connection::Connection;
use crate::errors::{ModelMethodError, QueryError};
use crate::hydrate::{Hydrator, PivotProjection};
use crate::query_builder::{JoinClause, JoinType, Operator, SelectField, WhereClause};
use crate::row::{Related, Row};
use crate::debug_log;
use std::fmt;
use type_mapping::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
    BelongsToMany,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::HasOne => "hasOne",
            RelationKind::HasMany => "hasMany",
            RelationKind::BelongsTo => "belongsTo",
            RelationKind::BelongsToMany => "belongsToMany",
        }
    }

    /// Whether `get` yields at most one row
    pub fn is_single(&self) -> bool {
        matches!(self, RelationKind::HasOne | RelationKind::BelongsTo)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point handed out by `Connection::relationships`
pub struct RelationshipBuilder<'c> {
    connection: &'c mut Connection,
}

impl<'c> RelationshipBuilder<'c> {
    pub fn new(connection: &'c mut Connection) -> Self {
        Self { connection }
    }

    fn scope(
        self,
        related: &str,
        key: &str,
        match_value: impl Into<Value>,
    ) -> Scope<'c> {
        let mut builder = Builder::new(self.connection);
        builder.table(related).where_eq(key, match_value);
        Scope {
            builder,
            related: related.to_string(),
            alias: None,
        }
    }

    /// Row of `related` whose `foreign_key` matches
    pub fn has_one(self, related: &str, match_value: impl Into<Value>, foreign_key: &str) -> HasOne<'c> {
        HasOne {
            scope: self.scope(related, foreign_key, match_value),
        }
    }

    /// Rows of `related` whose `foreign_key` matches
    pub fn has_many(self, related: &str, match_value: impl Into<Value>, foreign_key: &str) -> HasMany<'c> {
        HasMany {
            scope: self.scope(related, foreign_key, match_value),
        }
    }

    /// Parent row of `related` whose `key` matches
    pub fn belongs_to(self, related: &str, match_value: impl Into<Value>, key: &str) -> BelongsTo<'c> {
        BelongsTo {
            scope: self.scope(related, key, match_value),
        }
    }

    /// Rows of `related` linked through `pivot_table`
    ///
    /// `related.related_key` is joined to `pivot_table.pivot_foreign_key` and
    /// the pivot rows are filtered on `pivot_table.pivot_local_key`.
    pub fn belongs_to_many(
        self,
        related: &str,
        pivot_table: &str,
        pivot_local_key: &str,
        pivot_foreign_key: &str,
        related_key: &str,
        match_value: impl Into<Value>,
    ) -> BelongsToMany<'c> {
        let mut builder = Builder::new(self.connection);
        builder.table(related);

        let clauses = builder.clauses_mut();
        clauses.joins.push(JoinClause::new_on(
            JoinType::Inner,
            pivot_table,
            format!("{}.{}", related, related_key),
            Operator::Eq,
            format!("{}.{}", pivot_table, pivot_foreign_key),
        ));
        clauses.wheres.push(WhereClause::basic(
            format!("{}.{}", pivot_table, pivot_local_key),
            Operator::Eq,
            match_value,
        ));

        BelongsToMany {
            scope: Scope {
                builder,
                related: related.to_string(),
                alias: None,
            },
            pivot_table: pivot_table.to_string(),
            pivot: PivotProjection::new(vec![pivot_foreign_key.to_string()]),
        }
    }
}

struct Scope<'c> {
    builder: Builder<'c>,
    related: String,
    alias: Option<String>,
}

impl<'c> Scope<'c> {
    fn attribute(&self) -> String {
        self.alias.clone().unwrap_or_else(|| self.related.clone())
    }
}

macro_rules! relation_common {
    ($name:ident, $kind:expr) => {
        impl<'c> $name<'c> {
            pub fn kind(&self) -> RelationKind {
                $kind
            }

            pub fn related(&self) -> &str {
                &self.scope.related
            }

            /// Timestamp tracking is not supported on any relation kind
            pub fn with_timestamps(self) -> Result<Self, QueryError> {
                Err(QueryError::IncompatibleModifier {
                    modifier: "withTimestamps",
                    relation: $kind,
                })
            }

            /// Scoped builder, for extra ordering, limits or constraints
            pub fn query(&mut self) -> &mut Builder<'c> {
                &mut self.scope.builder
            }
        }
    };
}

pub struct HasOne<'c> {
    scope: Scope<'c>,
}

relation_common!(HasOne, RelationKind::HasOne);

impl<'c> HasOne<'c> {
    /// Attribute name used by `load_into`
    pub fn as_(mut self, alias: &str) -> Self {
        self.scope.alias = Some(alias.to_string());
        self
    }

    pub fn get(mut self) -> Result<Option<Row>, QueryError> {
        debug_log!("Resolving hasOne on {}", self.scope.related);
        self.scope.builder.first()
    }

    pub fn load_into(self, owner: &mut Row) -> Result<(), QueryError> {
        let attribute = self.scope.attribute();
        owner.set_relation(attribute, Related::one(self.get()?));
        Ok(())
    }
}

pub struct HasMany<'c> {
    scope: Scope<'c>,
}

relation_common!(HasMany, RelationKind::HasMany);

impl<'c> HasMany<'c> {
    /// Attribute name used by `load_into`
    pub fn as_(mut self, alias: &str) -> Self {
        self.scope.alias = Some(alias.to_string());
        self
    }

    pub fn get(mut self) -> Result<Vec<Row>, QueryError> {
        debug_log!("Resolving hasMany on {}", self.scope.related);
        self.scope.builder.get()
    }

    pub fn load_into(self, owner: &mut Row) -> Result<(), QueryError> {
        let attribute = self.scope.attribute();
        owner.set_relation(attribute, Related::Many(self.get()?));
        Ok(())
    }
}

pub struct BelongsTo<'c> {
    scope: Scope<'c>,
}

relation_common!(BelongsTo, RelationKind::BelongsTo);

impl<'c> BelongsTo<'c> {
    /// Attribute name used by `load_into`
    pub fn as_(mut self, alias: &str) -> Self {
        self.scope.alias = Some(alias.to_string());
        self
    }

    pub fn get(mut self) -> Result<Option<Row>, QueryError> {
        debug_log!("Resolving belongsTo on {}", self.scope.related);
        self.scope.builder.first()
    }

    pub fn load_into(self, owner: &mut Row) -> Result<(), QueryError> {
        let attribute = self.scope.attribute();
        owner.set_relation(attribute, Related::one(self.get()?));
        Ok(())
    }
}

pub struct BelongsToMany<'c> {
    scope: Scope<'c>,
    pivot_table: String,
    pivot: PivotProjection,
}

relation_common!(BelongsToMany, RelationKind::BelongsToMany);

impl<'c> BelongsToMany<'c> {
    pub fn pivot_table(&self) -> &str {
        &self.pivot_table
    }

    /// Project extra pivot columns into each row's pivot object
    pub fn with_pivot<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for column in columns {
            let column = column.as_ref();
            if !self.pivot.columns.iter().any(|c| c == column) {
                self.pivot.columns.push(column.to_string());
            }
        }
        self
    }

    /// Constrain on a pivot table column
    pub fn where_pivot(mut self, column: &str, value: impl Into<Value>) -> Self {
        let column = format!("{}.{}", self.pivot_table, column);
        self.scope.builder.where_eq(&column, value);
        self
    }

    /// Rename the pivot object attached to each row
    pub fn as_(mut self, alias: &str) -> Self {
        self.pivot.accessor = alias.to_string();
        self
    }

    fn projection(&self) -> Vec<SelectField> {
        let mut fields = vec![SelectField::field(format!("{}.*", self.scope.related))];
        fields.extend(self.pivot.columns.iter().map(|column| {
            SelectField::field_as(
                format!("{}.{}", self.pivot_table, column),
                PivotProjection::projected_name(column),
            )
        }));
        fields
    }

    pub fn get(mut self) -> Result<Vec<Row>, QueryError> {
        debug_log!(
            "Resolving belongsToMany on {} through {}",
            self.scope.related,
            self.pivot_table
        );
        let projection = self.projection();
        self.scope.builder.clauses_mut().columns = projection;
        let rows = self.scope.builder.fetch_raw()?;
        Ok(Hydrator::hydrate_with_pivot(rows, &self.pivot))
    }

    /// Attach the related rows to `owner` under the related table name
    pub fn load_into(self, owner: &mut Row) -> Result<(), QueryError> {
        let attribute = self.scope.related.clone();
        owner.set_relation(attribute, Related::Many(self.get()?));
        Ok(())
    }
}

/// Result of resolving an erased relation
#[derive(Debug, Clone, PartialEq)]
pub enum RelationResult {
    One(Option<Row>),
    Many(Vec<Row>),
}

impl RelationResult {
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            RelationResult::One(row) => row.into_iter().collect(),
            RelationResult::Many(rows) => rows,
        }
    }
}

/// Any relation kind, with pivot modifiers checked at runtime
pub enum Relation<'c> {
    HasOne(HasOne<'c>),
    HasMany(HasMany<'c>),
    BelongsTo(BelongsTo<'c>),
    BelongsToMany(BelongsToMany<'c>),
}

impl<'c> Relation<'c> {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::HasOne(r) => r.kind(),
            Relation::HasMany(r) => r.kind(),
            Relation::BelongsTo(r) => r.kind(),
            Relation::BelongsToMany(r) => r.kind(),
        }
    }

    pub fn with_pivot<I, S>(self, columns: I) -> Result<Self, ModelMethodError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self {
            Relation::BelongsToMany(r) => Ok(Relation::BelongsToMany(r.with_pivot(columns))),
            other => Err(ModelMethodError {
                method: "withPivot",
                relation: other.kind(),
            }),
        }
    }

    pub fn where_pivot(self, column: &str, value: impl Into<Value>) -> Result<Self, ModelMethodError> {
        match self {
            Relation::BelongsToMany(r) => Ok(Relation::BelongsToMany(r.where_pivot(column, value))),
            other => Err(ModelMethodError {
                method: "wherePivot",
                relation: other.kind(),
            }),
        }
    }

    pub fn as_(self, alias: &str) -> Self {
        match self {
            Relation::HasOne(r) => Relation::HasOne(r.as_(alias)),
            Relation::HasMany(r) => Relation::HasMany(r.as_(alias)),
            Relation::BelongsTo(r) => Relation::BelongsTo(r.as_(alias)),
            Relation::BelongsToMany(r) => Relation::BelongsToMany(r.as_(alias)),
        }
    }

    pub fn with_timestamps(self) -> Result<Self, QueryError> {
        Err(QueryError::IncompatibleModifier {
            modifier: "withTimestamps",
            relation: self.kind(),
        })
    }

    pub fn query(&mut self) -> &mut Builder<'c> {
        match self {
            Relation::HasOne(r) => r.query(),
            Relation::HasMany(r) => r.query(),
            Relation::BelongsTo(r) => r.query(),
            Relation::BelongsToMany(r) => r.query(),
        }
    }

    pub fn get(self) -> Result<RelationResult, QueryError> {
        Ok(match self {
            Relation::HasOne(r) => RelationResult::One(r.get()?),
            Relation::HasMany(r) => RelationResult::Many(r.get()?),
            Relation::BelongsTo(r) => RelationResult::One(r.get()?),
            Relation::BelongsToMany(r) => RelationResult::Many(r.get()?),
        })
    }

    pub fn load_into(self, owner: &mut Row) -> Result<(), QueryError> {
        match self {
            Relation::HasOne(r) => r.load_into(owner),
            Relation::HasMany(r) => r.load_into(owner),
            Relation::BelongsTo(r) => r.load_into(owner),
            Relation::BelongsToMany(r) => r.load_into(owner),
        }
    }
}

macro_rules! relation_from {
    ($name:ident) => {
        impl<'c> From<$name<'c>> for Relation<'c> {
            fn from(relation: $name<'c>) -> Self {
                Relation::$name(relation)
            }
        }
    };
}

relation_from!(HasOne);
relation_from!(HasMany);
relation_from!(BelongsTo);
relation_from!(BelongsToMany);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::{raw_row, MockDriver};
    use config::{DatabaseConfig, DriverKind};
    use pretty_assertions::assert_eq;

    fn connection(mock: &MockDriver) -> Connection {
        Connection::with_driver(
            DatabaseConfig::new(DriverKind::Mysql, "localhost", "ezdb_test", "root", "secret"),
            Box::new(mock.clone()),
        )
    }

    fn related_rows() -> Vec<crate::driver::RawRow> {
        vec![
            raw_row(vec![
                ("id", Value::from(1)),
                ("value", Value::from("Hello")),
                ("pivot_test_related_id", Value::from(1)),
            ]),
            raw_row(vec![
                ("id", Value::from(2)),
                ("value", Value::from("World")),
                ("pivot_test_related_id", Value::from(2)),
            ]),
        ]
    }

    #[test]
    fn test_has_one_scopes_on_foreign_key() {
        let mock = MockDriver::new();
        mock.respond_rows(vec![raw_row(vec![("intermediate_value", "Value")])]);
        let mut conn = connection(&mock);

        let row = conn
            .relationships()
            .has_one("test_intermediate", "1", "test_id")
            .get()
            .unwrap()
            .unwrap();
        assert_eq!(row.get("intermediate_value"), Some(&Value::from("Value")));

        let (sql, bindings) = &mock.executed()[0];
        assert_eq!(
            sql,
            "SELECT * FROM `test_intermediate` WHERE `test_id` = ? LIMIT ?"
        );
        assert_eq!(bindings, &vec![Value::from("1"), Value::Integer(1)]);
    }

    #[test]
    fn test_has_many_returns_rows_in_order() {
        let mock = MockDriver::new();
        mock.respond_rows(vec![
            raw_row(vec![("intermediate_value", "Value")]),
            raw_row(vec![("intermediate_value", "Value2")]),
        ]);
        let mut conn = connection(&mock);

        let rows = conn
            .relationships()
            .has_many("test_intermediate", "1", "test_id")
            .get()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("intermediate_value"), Some(&Value::from("Value2")));
        assert_eq!(
            mock.executed()[0].0,
            "SELECT * FROM `test_intermediate` WHERE `test_id` = ?"
        );
    }

    #[test]
    fn test_belongs_to_many_joins_pivot() {
        let mock = MockDriver::new();
        mock.respond_rows(related_rows());
        let mut conn = connection(&mock);

        let rows = conn
            .relationships()
            .belongs_to_many("test_related", "test_intermediate", "test_id", "test_related_id", "id", 1)
            .get()
            .unwrap();

        assert_eq!(
            mock.executed()[0].0,
            "SELECT `test_related`.*, `test_intermediate`.`test_related_id` AS `pivot_test_related_id` \
             FROM `test_related` \
             INNER JOIN `test_intermediate` ON `test_related`.`id` = `test_intermediate`.`test_related_id` \
             WHERE `test_intermediate`.`test_id` = ?"
        );
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "value"]);
        let pivot = rows[0].pivot().unwrap();
        assert_eq!(pivot.columns().collect::<Vec<_>>(), vec!["test_related_id"]);
        assert_eq!(pivot.get("test_related_id"), Some(&Value::from(1)));
    }

    #[test]
    fn test_with_pivot_and_where_pivot() {
        let mock = MockDriver::new();
        mock.respond_rows(vec![raw_row(vec![
            ("id", Value::from(2)),
            ("value", Value::from("World")),
            ("pivot_test_related_id", Value::from(2)),
            ("pivot_intermediate_value", Value::from("Value2")),
        ])]);
        let mut conn = connection(&mock);

        let rows = conn
            .relationships()
            .belongs_to_many("test_related", "test_intermediate", "test_id", "test_related_id", "id", 1)
            .where_pivot("intermediate_value", "Value2")
            .with_pivot(["intermediate_value"])
            .as_("intermediate")
            .get()
            .unwrap();

        let (sql, bindings) = &mock.executed()[0];
        assert!(sql.contains("`test_intermediate`.`intermediate_value` AS `pivot_intermediate_value`"));
        assert!(sql.ends_with(
            "WHERE `test_intermediate`.`test_id` = ? AND `test_intermediate`.`intermediate_value` = ?"
        ));
        assert_eq!(bindings, &vec![Value::from(1), Value::from("Value2")]);

        assert!(rows[0].pivot().is_none());
        let pivot = rows[0].nested("intermediate").unwrap();
        assert_eq!(
            pivot.columns().collect::<Vec<_>>(),
            vec!["test_related_id", "intermediate_value"]
        );
    }

    #[test]
    fn test_with_timestamps_is_rejected_before_execution() {
        let mock = MockDriver::new();
        let mut conn = connection(&mock);

        let err = conn
            .relationships()
            .belongs_to("test", "1", "id")
            .with_timestamps()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            QueryError::IncompatibleModifier {
                relation: RelationKind::BelongsTo,
                ..
            }
        ));

        let err = conn
            .relationships()
            .belongs_to_many("test_related", "test_intermediate", "test_id", "test_related_id", "id", 1)
            .with_timestamps()
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "Query error: withTimestamps is not supported on belongsToMany relations"
        );
        assert!(mock.executed().is_empty());
    }

    #[test]
    fn test_erased_relation_rejects_pivot_modifiers() {
        let mock = MockDriver::new();
        let mut conn = connection(&mock);

        let relation: Relation = conn.relationships().belongs_to("test", "1", "id").into();
        let err = relation.where_pivot("intermediate_value", "Value2").err().unwrap();
        assert_eq!(err.relation, RelationKind::BelongsTo);
        assert_eq!(err.method, "wherePivot");

        let relation: Relation = conn.relationships().has_many("test_intermediate", "1", "test_id").into();
        assert!(relation.with_pivot(["intermediate_value"]).is_err());
        assert!(mock.executed().is_empty());
        assert_eq!(mock.connects(), 0);
    }

    #[test]
    fn test_erased_relation_dispatches() {
        let mock = MockDriver::new();
        mock.respond_rows(related_rows());
        let mut conn = connection(&mock);

        let relation: Relation = conn
            .relationships()
            .belongs_to_many("test_related", "test_intermediate", "test_id", "test_related_id", "id", 1)
            .into();
        assert_eq!(relation.kind(), RelationKind::BelongsToMany);

        let result = relation.with_pivot(Vec::<String>::new()).unwrap().get().unwrap();
        match result {
            RelationResult::Many(rows) => assert_eq!(rows.len(), 2),
            other => panic!("expected many rows, got {:?}", other),
        }
    }

    #[test]
    fn test_load_into_uses_alias_or_table_name() {
        let mock = MockDriver::new();
        mock.respond_rows(vec![raw_row(vec![("id", 1), ("test_id", 1)])])
            .respond_rows(vec![raw_row(vec![("id", 1), ("name", 0)])]);
        let mut conn = connection(&mock);
        let mut owner = Row::from_pairs([("id", 1)]);

        conn.relationships()
            .has_many("test_intermediate", 1, "test_id")
            .load_into(&mut owner)
            .unwrap();
        conn.relationships()
            .belongs_to("test", 1, "id")
            .as_("parent")
            .load_into(&mut owner)
            .unwrap();

        assert_eq!(owner.many("test_intermediate").unwrap().len(), 1);
        assert!(owner.nested("parent").is_some());
        assert_eq!(owner.len(), 1);
    }

    #[test]
    fn test_query_adds_constraints() {
        let mock = MockDriver::new();
        let mut conn = connection(&mock);

        let mut relation = conn.relationships().has_many("test_intermediate", 1, "test_id");
        relation
            .query()
            .order_by("id", crate::query_builder::SortOrder::Desc)
            .limit(5);
        relation.get().unwrap();

        assert_eq!(
            mock.executed()[0].0,
            "SELECT * FROM `test_intermediate` WHERE `test_id` = ? ORDER BY `id` DESC LIMIT ?"
        );
    }
}
