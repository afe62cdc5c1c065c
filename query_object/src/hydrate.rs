//! Result hydration: raw driver rows to `Row` objects

use crate::driver::RawRow;
use crate::row::Row;

/// Accessor pivot data is attached under unless renamed
pub const DEFAULT_PIVOT_ACCESSOR: &str = "pivot";

/// Prefix pivot columns are projected under, so they cannot collide with
/// columns of the related table
pub const PIVOT_PREFIX: &str = "pivot_";

/// Pivot columns a many-to-many query projects and where to attach them
#[derive(Debug, Clone, PartialEq)]
pub struct PivotProjection {
    pub accessor: String,
    pub columns: Vec<String>,
}

impl PivotProjection {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            accessor: DEFAULT_PIVOT_ACCESSOR.to_string(),
            columns,
        }
    }

    pub fn projected_name(column: &str) -> String {
        format!("{}{}", PIVOT_PREFIX, column)
    }
}

pub struct Hydrator;

impl Hydrator {
    pub fn hydrate(rows: Vec<RawRow>) -> Vec<Row> {
        rows.into_iter().map(Row::from_pairs).collect()
    }

    pub fn hydrate_one(rows: Vec<RawRow>) -> Option<Row> {
        rows.into_iter().next().map(Row::from_pairs)
    }

    /// Hydrate rows and move the projected pivot columns of each into a
    /// nested row under the pivot accessor
    pub fn hydrate_with_pivot(rows: Vec<RawRow>, pivot: &PivotProjection) -> Vec<Row> {
        let projected: Vec<(String, &str)> = pivot
            .columns
            .iter()
            .map(|column| (PivotProjection::projected_name(column), column.as_str()))
            .collect();

        rows.into_iter()
            .map(|raw| {
                let mut row = Row::new();
                let mut pivot_row = Row::new();
                for (column, value) in raw {
                    match projected.iter().find(|(name, _)| *name == column) {
                        Some((_, original)) => pivot_row.set(*original, value),
                        None => row.set(column, value),
                    }
                }
                row.set_relation(pivot.accessor.clone(), crate::row::Related::one(Some(pivot_row)));
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::raw_row;
    use type_mapping::Value;

    #[test]
    fn test_hydrate_keeps_columns() {
        let rows = Hydrator::hydrate(vec![
            raw_row(vec![("id", Value::from(1)), ("name", Value::from("A"))]),
            raw_row(vec![("id", Value::from(2)), ("name", Value::from("B"))]),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("name"), Some(&Value::from("B")));
        assert!(Hydrator::hydrate_one(Vec::new()).is_none());
    }

    #[test]
    fn test_pivot_columns_move_to_nested_row() {
        let mut pivot = PivotProjection::new(vec![
            "test_related_id".to_string(),
            "intermediate_value".to_string(),
        ]);
        pivot.accessor = "intermediate".to_string();

        let rows = Hydrator::hydrate_with_pivot(
            vec![raw_row(vec![
                ("id", Value::from(1)),
                ("related_value", Value::from("Hello")),
                ("pivot_test_related_id", Value::from(1)),
                ("pivot_intermediate_value", Value::from("x")),
            ])],
            &pivot,
        );

        let row = &rows[0];
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "related_value"]);
        let nested = row.nested("intermediate").unwrap();
        assert_eq!(
            nested.columns().collect::<Vec<_>>(),
            vec!["test_related_id", "intermediate_value"]
        );
        assert!(row.pivot().is_none());
    }
}
