//! Structural schema validation over `serde_json::Value`.
//!
//! Supports the JSON-Schema keywords the policy and script documents use:
//! `type`, `required`, `properties`, `additionalProperties` (bool), `items`,
//! `enum`, `minLength`, `maxLength`, `minimum`, `maximum`, `minItems` and
//! `format: date-time`. Unknown keywords are ignored.

use std::path::Path;

use serde_json::{json, Value};

use crate::errors::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct StructuralSchema {
    root: Value,
}

impl StructuralSchema {
    pub fn from_value(root: Value) -> Result<Self, ConfigError> {
        if !root.is_object() {
            return Err(ConfigError::ValidationFailed {
                field: "schema".to_string(),
                message: "schema root must be an object".to_string(),
            });
        }
        Ok(Self { root })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let root: Value = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_value(root)
    }

    /// Built-in structure of a generated script document.
    pub fn script_v1() -> Self {
        Self {
            root: json!({
                "title": "script_v1",
                "type": "object",
                "required": ["topic", "content", "metadata"],
                "properties": {
                    "topic": {"type": "string", "minLength": 1},
                    "content": {"type": "string", "minLength": 1},
                    "metadata": {
                        "type": "object",
                        "required": ["model", "timestamp"],
                        "properties": {
                            "model": {"type": "string"},
                            "timestamp": {"type": "string", "format": "date-time"},
                            "word_count": {"type": "integer", "minimum": 0},
                            "duration_seconds": {"type": "number", "minimum": 0}
                        }
                    }
                }
            }),
        }
    }

    pub fn title(&self) -> &str {
        self.root
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("untitled")
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Validate `doc`, returning every violation as `"<path>: <message>"`.
    pub fn validate(&self, doc: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        validate_node(&self.root, doc, "$", &mut errors);
        errors
    }
}

fn validate_node(schema: &Value, value: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(expected) = schema.get("type") {
        let allowed: Vec<&str> = match expected {
            Value::String(t) => vec![t.as_str()],
            Value::Array(ts) => ts.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if !allowed.is_empty() && !allowed.iter().any(|t| type_matches(t, value)) {
            errors.push(format!(
                "{path}: expected {}, found {}",
                allowed.join(" | "),
                type_name(value)
            ));
            // Nested keywords are meaningless once the type is wrong.
            return;
        }
    }

    if let Some(Value::Array(options)) = schema.get("enum") {
        if !options.contains(value) {
            errors.push(format!("{path}: {value} is not one of {}", Value::Array(options.clone())));
        }
    }

    match value {
        Value::Object(map) => {
            if let Some(Value::Array(required)) = schema.get("required") {
                for key in required.iter().filter_map(Value::as_str) {
                    if !map.contains_key(key) {
                        errors.push(format!("{path}: '{key}' is a required property"));
                    }
                }
            }
            let properties = schema.get("properties").and_then(Value::as_object);
            if let Some(props) = properties {
                for (key, sub_schema) in props {
                    if let Some(child) = map.get(key) {
                        validate_node(sub_schema, child, &format!("{path}.{key}"), errors);
                    }
                }
            }
            if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
                for key in map.keys() {
                    if !properties.is_some_and(|p| p.contains_key(key)) {
                        errors.push(format!("{path}: additional property '{key}' is not allowed"));
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
                if (items.len() as u64) < min {
                    errors.push(format!("{path}: expected at least {min} items, found {}", items.len()));
                }
            }
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter().enumerate() {
                    validate_node(item_schema, item, &format!("{path}[{i}]"), errors);
                }
            }
        }
        Value::String(s) => {
            let len = s.chars().count() as u64;
            if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
                if len < min {
                    errors.push(format!("{path}: string shorter than {min} characters"));
                }
            }
            if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
                if len > max {
                    errors.push(format!("{path}: string longer than {max} characters"));
                }
            }
            if schema.get("format").and_then(Value::as_str) == Some("date-time")
                && chrono::DateTime::parse_from_rfc3339(s).is_err()
            {
                errors.push(format!("{path}: '{s}' is not a valid date-time"));
            }
        }
        Value::Number(n) => {
            if let Some(x) = n.as_f64() {
                if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
                    if x < min {
                        errors.push(format!("{path}: {x} is less than the minimum of {min}"));
                    }
                }
                if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
                    if x > max {
                        errors.push(format!("{path}: {x} is greater than the maximum of {max}"));
                    }
                }
            }
        }
        Value::Bool(_) | Value::Null => {}
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
        Value::Number(_) => "number",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_script() -> Value {
        json!({
            "topic": "ocean",
            "content": "O mar é azul.",
            "metadata": {"model": "m", "timestamp": "2024-01-01T00:00:00Z", "word_count": 4}
        })
    }

    #[test]
    fn valid_script_has_no_errors() {
        assert!(StructuralSchema::script_v1().validate(&valid_script()).is_empty());
    }

    #[test]
    fn reports_missing_and_mistyped_fields() {
        let mut doc = valid_script();
        doc.as_object_mut().unwrap().remove("topic");
        doc["metadata"]["word_count"] = json!("four");
        doc["metadata"]["timestamp"] = json!("yesterday");
        let errors = StructuralSchema::script_v1().validate(&doc);
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("'topic' is a required property")));
        assert!(errors.iter().any(|e| e.starts_with("$.metadata.word_count")));
        assert!(errors.iter().any(|e| e.contains("date-time")));
    }

    #[test]
    fn additional_properties_and_enum() {
        let schema = StructuralSchema::from_value(json!({
            "type": "object",
            "properties": {"mode": {"enum": ["a", "b"]}},
            "additionalProperties": false
        }))
        .unwrap();
        let errors = schema.validate(&json!({"mode": "c", "other": 1}));
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert!(StructuralSchema::from_value(json!([1, 2])).is_err());
    }
}
