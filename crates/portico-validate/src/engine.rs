//! The schema-engine contract and the built-in field-rule engine.

use crate::schema::{FieldKind, FieldRule, Schema};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Options resolved per section before the engine runs.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Whether keys not declared in the schema are allowed through.
    pub allow_unknown: bool,
}

/// A single validation failure, naming the offending field.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationFault {
    /// The field the failure refers to (empty for section-level faults).
    pub field: String,
    /// Human-readable description, includes the field name.
    pub message: String,
}

impl ValidationFault {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The declarative schema-validation collaborator.
///
/// `validate` returns the coerced values on success; the caller merges them
/// back into the event section. Implementations must be idempotent: running
/// on already-coerced output yields the same output.
pub trait SchemaEngine: Send + Sync {
    /// Validates `values` against `schema`, returning coerced output.
    fn validate(
        &self,
        values: &Value,
        schema: &Schema,
        options: &EngineOptions,
    ) -> Result<Value, ValidationFault>;
}

/// The built-in [`SchemaEngine`].
///
/// Supports required checking, typed fields (string, number, boolean,
/// object, array, any), string trimming, numeric/boolean coercion from
/// strings, and the unknown-key policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRuleEngine;

impl FieldRuleEngine {
    /// Creates the engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn coerce(field: &str, value: &Value, rule: &FieldRule) -> Result<Value, ValidationFault> {
        match rule.kind() {
            FieldKind::Any => Ok(value.clone()),
            FieldKind::String => match value {
                Value::String(s) => {
                    if rule.trims() {
                        Ok(Value::String(s.trim().to_string()))
                    } else {
                        Ok(value.clone())
                    }
                }
                _ => Err(ValidationFault::new(
                    field,
                    format!("\"{field}\" must be a string"),
                )),
            },
            FieldKind::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::String(s) => parse_number(s.trim()).ok_or_else(|| {
                    ValidationFault::new(field, format!("\"{field}\" must be a number"))
                }),
                _ => Err(ValidationFault::new(
                    field,
                    format!("\"{field}\" must be a number"),
                )),
            },
            FieldKind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) => match s.trim() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(ValidationFault::new(
                        field,
                        format!("\"{field}\" must be a boolean"),
                    )),
                },
                _ => Err(ValidationFault::new(
                    field,
                    format!("\"{field}\" must be a boolean"),
                )),
            },
            FieldKind::Object => match value {
                Value::Object(_) => Ok(value.clone()),
                _ => Err(ValidationFault::new(
                    field,
                    format!("\"{field}\" must be an object"),
                )),
            },
            FieldKind::Array(element) => match value {
                Value::Array(values) => {
                    let mut coerced = Vec::with_capacity(values.len());
                    for item in values {
                        coerced.push(Self::coerce(field, item, element)?);
                    }
                    Ok(Value::Array(coerced))
                }
                _ => Err(ValidationFault::new(
                    field,
                    format!("\"{field}\" must be an array"),
                )),
            },
        }
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::Number(Number::from(int)));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

impl SchemaEngine for FieldRuleEngine {
    fn validate(
        &self,
        values: &Value,
        schema: &Schema,
        options: &EngineOptions,
    ) -> Result<Value, ValidationFault> {
        let empty = Map::new();
        let object = match values {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => {
                return Err(ValidationFault::new(
                    "",
                    "section value is not an object".to_string(),
                ))
            }
        };

        let mut output = Map::new();

        for (name, value) in object {
            match schema.rule(name) {
                Some(rule) => {
                    if value.is_null() {
                        output.insert(name.clone(), Value::Null);
                    } else {
                        output.insert(name.clone(), Self::coerce(name, value, rule)?);
                    }
                }
                None => {
                    if !options.allow_unknown {
                        return Err(ValidationFault::new(
                            name,
                            format!("\"{name}\" is not allowed"),
                        ));
                    }
                    output.insert(name.clone(), value.clone());
                }
            }
        }

        for (name, rule) in schema.fields() {
            let present = object.get(name).is_some_and(|value| !value.is_null());
            if rule.is_required() && !present {
                return Err(ValidationFault::new(
                    name,
                    format!("\"{name}\" is required"),
                ));
            }
        }

        Ok(Value::Object(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOW: EngineOptions = EngineOptions {
        allow_unknown: true,
    };
    const STRICT: EngineOptions = EngineOptions {
        allow_unknown: false,
    };

    fn engine() -> FieldRuleEngine {
        FieldRuleEngine::new()
    }

    #[test]
    fn trims_string_fields() {
        let schema = Schema::new().field("name", FieldRule::string().trim().required());
        let out = engine()
            .validate(&json!({"name": "  John Doe  "}), &schema, &ALLOW)
            .unwrap();
        assert_eq!(out, json!({"name": "John Doe"}));
    }

    #[test]
    fn missing_required_field_faults_with_field_name() {
        let schema = Schema::new()
            .field("name", FieldRule::string().required())
            .field("age", FieldRule::number().required());
        let fault = engine()
            .validate(&json!({"name": "John"}), &schema, &ALLOW)
            .unwrap_err();
        assert_eq!(fault.field, "age");
        assert_eq!(fault.message, "\"age\" is required");
    }

    #[test]
    fn null_counts_as_missing_for_required() {
        let schema = Schema::new().field("age", FieldRule::number().required());
        let fault = engine()
            .validate(&json!({"age": null}), &schema, &ALLOW)
            .unwrap_err();
        assert_eq!(fault.field, "age");
    }

    #[test]
    fn numeric_strings_coerce_to_numbers() {
        let schema = Schema::new().field("age", FieldRule::number());
        let out = engine()
            .validate(&json!({"age": "42"}), &schema, &ALLOW)
            .unwrap();
        assert_eq!(out, json!({"age": 42}));

        let out = engine()
            .validate(&json!({"age": "2.5"}), &schema, &ALLOW)
            .unwrap();
        assert_eq!(out, json!({"age": 2.5}));
    }

    #[test]
    fn boolean_strings_coerce() {
        let schema = Schema::new().field("flag", FieldRule::boolean());
        let out = engine()
            .validate(&json!({"flag": "true"}), &schema, &ALLOW)
            .unwrap();
        assert_eq!(out, json!({"flag": true}));
    }

    #[test]
    fn wrong_type_faults() {
        let schema = Schema::new().field("age", FieldRule::number());
        let fault = engine()
            .validate(&json!({"age": {"nested": 1}}), &schema, &ALLOW)
            .unwrap_err();
        assert_eq!(fault.message, "\"age\" must be a number");
    }

    #[test]
    fn unknown_keys_pass_when_allowed() {
        let schema = Schema::new().field("name", FieldRule::string());
        let out = engine()
            .validate(&json!({"name": "x", "extra": 1}), &schema, &ALLOW)
            .unwrap();
        assert_eq!(out, json!({"name": "x", "extra": 1}));
    }

    #[test]
    fn unknown_keys_fault_when_strict() {
        let schema = Schema::new().field("name", FieldRule::string());
        let fault = engine()
            .validate(&json!({"name": "x", "extra": 1}), &schema, &STRICT)
            .unwrap_err();
        assert_eq!(fault.message, "\"extra\" is not allowed");
    }

    #[test]
    fn arrays_validate_element_wise() {
        let schema = Schema::new().field(
            "tags",
            FieldRule::array(FieldRule::string().trim()).required(),
        );
        let out = engine()
            .validate(&json!({"tags": [" a ", "b"]}), &schema, &ALLOW)
            .unwrap();
        assert_eq!(out, json!({"tags": ["a", "b"]}));

        let fault = engine()
            .validate(&json!({"tags": "not-array"}), &schema, &ALLOW)
            .unwrap_err();
        assert_eq!(fault.message, "\"tags\" must be an array");
    }

    #[test]
    fn null_section_validates_as_empty_object() {
        let schema = Schema::new().field("name", FieldRule::string());
        let out = engine().validate(&Value::Null, &schema, &ALLOW).unwrap();
        assert_eq!(out, json!({}));
    }

    #[test]
    fn non_object_section_faults() {
        let schema = Schema::new();
        let fault = engine()
            .validate(&json!("just a string"), &schema, &ALLOW)
            .unwrap_err();
        assert_eq!(fault.message, "section value is not an object");
    }

    #[test]
    fn validation_is_idempotent() {
        let schema = Schema::new()
            .field("name", FieldRule::string().trim().required())
            .field("age", FieldRule::number());
        let input = json!({"name": " John ", "age": "42", "extra": true});

        let once = engine().validate(&input, &schema, &ALLOW).unwrap();
        let twice = engine().validate(&once, &schema, &ALLOW).unwrap();
        assert_eq!(once, twice);
    }
}
