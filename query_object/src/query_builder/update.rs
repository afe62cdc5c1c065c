use type_mapping::Value;

/// Single `column = value` assignment of an UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub column: String,
    pub value: Value,
}

/// Ordered container for update assignments
///
/// Setting a column twice replaces its value but keeps its first position,
/// so SET bindings stay in the order columns were first named.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet {
    pub operations: Vec<SetClause>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.operations.iter_mut().find(|op| op.column == column) {
            Some(existing) => existing.value = value,
            None => self.operations.push(SetClause { column, value }),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.operations.iter().map(|op| &op.value)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_first_position() {
        let mut set = UpdateSet::new();
        set.set("name", "a");
        set.set("created_at", "2024-01-01 00:00:00");
        set.set("name", "b");

        assert_eq!(set.len(), 2);
        assert_eq!(set.operations[0].column, "name");
        assert_eq!(set.operations[0].value, Value::from("b"));
    }
}
