//! WHERE clause model
//!
//! Each where clause keeps its own connective and negation flag; the list
//! order is the order fragments and bindings appear in compiled SQL.

use crate::errors::QueryError;
use std::fmt;
use std::str::FromStr;
use type_mapping::Value;

/// Comparison operators accepted by `where`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,           // =
    Lt,           // <
    Gt,           // >
    Lte,          // <=
    Gte,          // >=
    Ne,           // <>
    NotEq,        // !=
    NullSafeEq,   // <=>
    Like,
    LikeBinary,
    NotLike,
    ILike,
    NotILike,
    RLike,
    NotRLike,
    Regexp,
    NotRegexp,
    SimilarTo,
    NotSimilarTo,
    BitAnd,       // &
    BitOr,        // |
    BitXor,       // ^
    ShiftLeft,    // <<
    ShiftRight,   // >>
    Match,        // ~
    IMatch,       // ~*
    NotMatch,     // !~
    NotIMatch,    // !~*
}

impl Operator {
    pub const ALL: [Operator; 28] = [
        Operator::Eq,
        Operator::Lt,
        Operator::Gt,
        Operator::Lte,
        Operator::Gte,
        Operator::Ne,
        Operator::NotEq,
        Operator::NullSafeEq,
        Operator::Like,
        Operator::LikeBinary,
        Operator::NotLike,
        Operator::ILike,
        Operator::NotILike,
        Operator::RLike,
        Operator::NotRLike,
        Operator::Regexp,
        Operator::NotRegexp,
        Operator::SimilarTo,
        Operator::NotSimilarTo,
        Operator::BitAnd,
        Operator::BitOr,
        Operator::BitXor,
        Operator::ShiftLeft,
        Operator::ShiftRight,
        Operator::Match,
        Operator::IMatch,
        Operator::NotMatch,
        Operator::NotIMatch,
    ];

    pub fn to_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Ne => "<>",
            Operator::NotEq => "!=",
            Operator::NullSafeEq => "<=>",
            Operator::Like => "LIKE",
            Operator::LikeBinary => "LIKE BINARY",
            Operator::NotLike => "NOT LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotILike => "NOT ILIKE",
            Operator::RLike => "RLIKE",
            Operator::NotRLike => "NOT RLIKE",
            Operator::Regexp => "REGEXP",
            Operator::NotRegexp => "NOT REGEXP",
            Operator::SimilarTo => "SIMILAR TO",
            Operator::NotSimilarTo => "NOT SIMILAR TO",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::Match => "~",
            Operator::IMatch => "~*",
            Operator::NotMatch => "!~",
            Operator::NotIMatch => "!~*",
        }
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    /// Case-insensitive; inner whitespace is normalized so `not  like` matches
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.to_sql() == normalized)
            .ok_or_else(|| QueryError::InvalidOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// Connective joining a clause to the clauses before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl FromStr for LogicalOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            _ => Err(QueryError::InvalidOperator(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WhereKind {
    Basic { operator: Operator, value: Value },
    IsNull,
    Between { low: Value, high: Value },
    In(Vec<Value>),
}

impl WhereKind {
    /// Values this clause binds, in placeholder order
    pub fn values(&self) -> Vec<&Value> {
        match self {
            WhereKind::Basic { value, .. } => vec![value],
            WhereKind::IsNull => Vec::new(),
            WhereKind::Between { low, high } => vec![low, high],
            WhereKind::In(values) => values.iter().collect(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            WhereKind::Basic { .. } => "basic",
            WhereKind::IsNull => "isnull",
            WhereKind::Between { .. } => "between",
            WhereKind::In(_) => "in",
        }
    }
}

/// Single clause in WHERE
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub column: String,
    pub boolean: LogicalOperator,
    pub not: bool,
    pub kind: WhereKind,
}

impl WhereClause {
    pub fn new(column: impl Into<String>, kind: WhereKind) -> Self {
        Self {
            column: column.into(),
            boolean: LogicalOperator::And,
            not: false,
            kind,
        }
    }

    pub fn basic(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::new(
            column,
            WhereKind::Basic {
                operator,
                value: value.into(),
            },
        )
    }

    pub fn with_boolean(mut self, boolean: LogicalOperator) -> Self {
        self.boolean = boolean;
        self
    }

    pub fn negated(mut self, not: bool) -> Self {
        self.not = not;
        self
    }
}
