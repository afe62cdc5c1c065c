/// Aggregate terminal operations of the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn to_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

/// Alias every aggregate query projects its result under
pub const AGGREGATE_ALIAS: &str = "aggregate";

/// One projected item of a SELECT
#[derive(Debug, Clone, PartialEq)]
pub enum SelectField {
    All,
    /// `name`, `table.name` or `table.*`
    Field(String),
    FieldWithAlias { field: String, alias: String },
    /// `field` is `None` for `COUNT(*)`
    Aggregate {
        function: AggregateFunction,
        field: Option<String>,
        alias: Option<String>,
    },
}

impl SelectField {
    /// `*` selects everything, anything else names a column
    pub fn field(field: impl Into<String>) -> Self {
        let field = field.into();
        if field.trim() == "*" {
            SelectField::All
        } else {
            SelectField::Field(field)
        }
    }

    pub fn field_as(field: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectField::FieldWithAlias {
            field: field.into(),
            alias: alias.into(),
        }
    }

    /// Aggregate projected under `aggregate`; a `*` column counts rows
    pub fn aggregate(function: AggregateFunction, field: &str) -> Self {
        let field = match field.trim() {
            "*" => None,
            other => Some(other.to_string()),
        };
        SelectField::Aggregate {
            function,
            field,
            alias: Some(AGGREGATE_ALIAS.to_string()),
        }
    }

    pub fn count_all() -> Self {
        Self::aggregate(AggregateFunction::Count, "*")
    }
}
