//! Wire type inference
//!
//! Drivers bind every parameter with an explicit wire type. The type is
//! inferred from the value; anything without a native mapping binds as text.

use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Text,
    Integer,
    Float,
    Boolean,
}

impl WireType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Integer(_) => WireType::Integer,
            Value::Float(_) => WireType::Float,
            Value::Boolean(_) => WireType::Boolean,
            Value::Text(_) | Value::Null => WireType::Text,
        }
    }

    /// Single-character type code used by mysqli-style binders
    pub fn type_code(&self) -> char {
        match self {
            WireType::Integer => 'i',
            WireType::Float => 'd',
            WireType::Text | WireType::Boolean => 's',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WireType::Text => "string",
            WireType::Integer => "int",
            WireType::Float => "float",
            WireType::Boolean => "bool",
        }
    }
}

impl Value {
    pub fn wire_type(&self) -> WireType {
        WireType::of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference() {
        assert_eq!(Value::from("a").wire_type(), WireType::Text);
        assert_eq!(Value::from(1).wire_type(), WireType::Integer);
        assert_eq!(Value::from(1.0).wire_type(), WireType::Float);
        assert_eq!(Value::from(false).wire_type(), WireType::Boolean);
    }

    #[test]
    fn test_unknown_defaults_to_text() {
        assert_eq!(Value::Null.wire_type(), WireType::Text);
        assert_eq!(WireType::of(&Value::Null).type_code(), 's');
    }

    #[test]
    fn test_type_codes() {
        assert_eq!(WireType::Integer.type_code(), 'i');
        assert_eq!(WireType::Float.type_code(), 'd');
        assert_eq!(WireType::Boolean.type_code(), 's');
    }
}
