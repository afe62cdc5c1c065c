//! Hydrated result rows
//!
//! A `Row` exposes exactly the columns a query projected, in projection
//! order, plus any related rows attached by the relationship resolver.

use serde::ser::{Serialize, SerializeMap, Serializer};
use type_mapping::{to_json, Value};

/// Related data attached to a row under a name
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    One(Option<Box<Row>>),
    Many(Vec<Row>),
}

impl Related {
    pub fn one(row: Option<Row>) -> Self {
        Related::One(row.map(Box::new))
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Related::One(Some(row)) => row.to_json(),
            Related::One(None) => serde_json::Value::Null,
            Related::Many(rows) => serde_json::Value::Array(rows.iter().map(Row::to_json).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    attributes: Vec<(String, Value)>,
    relations: Vec<(String, Related)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, C, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Value>,
    {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.set(column, value);
        }
        row
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Set a column, replacing an existing value in place
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((column, value)),
        }
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.attributes.iter().position(|(name, _)| name == column)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Number of columns; relations are not counted
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn relation(&self, name: &str) -> Option<&Related> {
        self.relations
            .iter()
            .find(|(relation, _)| relation == name)
            .map(|(_, related)| related)
    }

    pub fn set_relation(&mut self, name: impl Into<String>, related: Related) {
        let name = name.into();
        match self.relations.iter_mut().find(|(relation, _)| *relation == name) {
            Some((_, existing)) => *existing = related,
            None => self.relations.push((name, related)),
        }
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &Related)> {
        self.relations.iter().map(|(name, related)| (name.as_str(), related))
    }

    /// Single related row attached under `name`
    pub fn nested(&self, name: &str) -> Option<&Row> {
        match self.relation(name)? {
            Related::One(row) => row.as_deref(),
            Related::Many(_) => None,
        }
    }

    /// Related rows attached under `name`
    pub fn many(&self, name: &str) -> Option<&[Row]> {
        match self.relation(name)? {
            Related::Many(rows) => Some(rows),
            Related::One(_) => None,
        }
    }

    /// Pivot data under the default accessor
    pub fn pivot(&self) -> Option<&Row> {
        self.nested(crate::hydrate::DEFAULT_PIVOT_ACCESSOR)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.attributes {
            map.insert(name.clone(), to_json(value));
        }
        for (name, related) in &self.relations {
            map.insert(name.clone(), related.to_json());
        }
        serde_json::Value::Object(map)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + self.relations.len()))?;
        for (name, value) in &self.attributes {
            map.serialize_entry(name, value)?;
        }
        for (name, related) in &self.relations {
            map.serialize_entry(name, &related.to_json())?;
        }
        map.end()
    }
}
