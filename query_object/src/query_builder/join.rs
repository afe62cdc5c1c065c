use crate::query_builder::filter::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

/// Column comparison in the ON part of a join (`first operator second`)
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub first: String,
    pub operator: Operator,
    pub second: String,
}

/// Joined table and its ON condition
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub condition: JoinCondition,
}

impl JoinClause {
    pub fn new_on(
        join_type: JoinType,
        table: impl Into<String>,
        first: impl Into<String>,
        operator: Operator,
        second: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            table: table.into(),
            condition: JoinCondition {
                first: first.into(),
                operator,
                second: second.into(),
            },
        }
    }
}
