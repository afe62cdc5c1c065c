//! INSERT row model

use crate::errors::QueryError;
use type_mapping::Value;

/// One row of an INSERT, columns in caller order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertRow {
    pub values: Vec<(String, Value)>,
}

impl InsertRow {
    pub fn new<I, C, V>(row: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Value>,
    {
        Self {
            values: row
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(column, _)| column.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Column list of a batch and its rows realigned to that order.
///
/// The first row fixes the column order; every other row must name exactly
/// the same columns.
pub fn align_rows(rows: &[InsertRow]) -> Result<(Vec<&str>, Vec<Vec<&Value>>), QueryError> {
    let first = rows
        .first()
        .ok_or_else(|| QueryError::Unsupported("insert needs at least one row".to_string()))?;
    if first.is_empty() {
        return Err(QueryError::Unsupported(
            "insert row has no columns".to_string(),
        ));
    }

    let columns: Vec<&str> = first.columns().collect();
    let mut aligned = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(column_mismatch(index));
        }
        let values = columns
            .iter()
            .map(|column| row.get(column).ok_or_else(|| column_mismatch(index)))
            .collect::<Result<Vec<_>, _>>()?;
        aligned.push(values);
    }
    Ok((columns, aligned))
}

fn column_mismatch(index: usize) -> QueryError {
    QueryError::Unsupported(format!(
        "insert row {} does not have the same columns as the first row",
        index
    ))
}
