//! Serialization utilities
//!
//! Conversions between `Value` and `serde_json::Value`.

use crate::types::Value;

/// Convert a value to JSON
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
    }
}

/// Convert JSON to a value. Arrays and objects have no scalar form and are
/// kept as their JSON text.
pub fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Text(other.to_string()),
    }
}

/// Convert an ordered record to a JSON object
pub fn record_to_json<'a, I>(record: I) -> serde_json::Map<String, serde_json::Value>
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    record
        .into_iter()
        .map(|(name, value)| (name.to_string(), to_json(value)))
        .collect()
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        from_json(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_scalars() {
        assert_eq!(from_json(json!(3)), Value::Integer(3));
        assert_eq!(from_json(json!(0.5)), Value::Float(0.5));
        assert_eq!(from_json(json!("x")), Value::Text("x".into()));
        assert_eq!(from_json(json!(null)), Value::Null);
        assert_eq!(to_json(&Value::Float(f64::NAN)), serde_json::Value::Null);
    }

    #[test]
    fn test_json_compound_kept_as_text() {
        assert_eq!(from_json(json!({"a": 1})), Value::Text("{\"a\":1}".into()));
    }

    #[test]
    fn test_untagged_serde() {
        let values: Vec<Value> = serde_json::from_str(r#"[1, "a", null, true, 1.5]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Integer(1),
                Value::Text("a".into()),
                Value::Null,
                Value::Boolean(true),
                Value::Float(1.5)
            ]
        );
    }
}
