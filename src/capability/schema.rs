//! Argument shapes and the schema validator.
//!
//! A shape is an ordered list of [`FieldSpec`]s. [`ArgumentShape::validate`]
//! checks a raw argument mapping against it and either returns
//! [`ValidatedArguments`] or the first [`ValidationError`] found, in field
//! declaration order.

use serde_json::{json, Map, Value};
use std::collections::HashSet;

use crate::error::{HandlerError, RegistryError, ValidationError};

/// Primitive type of a declared field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number { min: Option<f64>, max: Option<f64> },
    Boolean,
    Enum { allowed: Vec<String> },
}

impl FieldKind {
    /// JSON Schema type name
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::Enum { .. } => "string",
            FieldKind::Number { .. } => "number",
            FieldKind::Boolean => "boolean",
        }
    }
}

/// One named field of an argument shape
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub description: Option<String>,
    pub kind: FieldKind,
    pub optional: bool,
    pub default: Option<Value>,
}

impl FieldSpec {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            optional: false,
            default: None,
        }
    }

    /// Required string field
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// Required unbounded number field
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number { min: None, max: None })
    }

    /// Required boolean field
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Required enum-of-strings field
    pub fn enumeration(name: impl Into<String>, allowed: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Enum {
                allowed: allowed.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Set a default; a field with a default is optional
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.optional = true;
        self.default = Some(default.into());
        self
    }

    /// Inclusive bounds for a number field; no effect on other kinds
    pub fn range(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        if let FieldKind::Number { min, max } = &mut self.kind {
            *min = lower;
            *max = upper;
        }
        self
    }

    fn coerce(&self, value: &Value) -> std::result::Result<Value, ValidationError> {
        match &self.kind {
            FieldKind::String => match value {
                Value::String(_) => Ok(value.clone()),
                other => Err(self.mismatch(other)),
            },
            FieldKind::Number { min, max } => {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|n| n.is_finite())
                .ok_or_else(|| self.mismatch(value))?;

                let below = min.map_or(false, |min| number < min);
                let above = max.map_or(false, |max| number > max);
                if below || above {
                    return Err(ValidationError::OutOfRange {
                        field: self.name.clone(),
                        value: number,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(Value::from(number))
            }
            FieldKind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                other => Err(self.mismatch(other)),
            },
            FieldKind::Enum { allowed } => match value {
                Value::String(s) if allowed.iter().any(|a| a == s) => Ok(value.clone()),
                Value::String(s) => Err(ValidationError::InvalidEnumValue {
                    field: self.name.clone(),
                    value: s.clone(),
                    allowed: allowed.clone(),
                }),
                other => Err(self.mismatch(other)),
            },
        }
    }

    fn mismatch(&self, actual: &Value) -> ValidationError {
        ValidationError::TypeMismatch {
            field: self.name.clone(),
            expected: self.kind.type_name(),
            actual: json_type_name(actual),
        }
    }

    fn property_schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(self.kind.type_name()));
        if let Some(description) = &self.description {
            property.insert("description".to_string(), json!(description));
        }
        match &self.kind {
            FieldKind::Enum { allowed } => {
                property.insert("enum".to_string(), json!(allowed));
            }
            FieldKind::Number { min, max } => {
                if let Some(min) = min {
                    property.insert("minimum".to_string(), json!(min));
                }
                if let Some(max) = max {
                    property.insert("maximum".to_string(), json!(max));
                }
            }
            FieldKind::String | FieldKind::Boolean => {}
        }
        if let Some(default) = &self.default {
            property.insert("default".to_string(), default.clone());
        }
        Value::Object(property)
    }
}

/// Name of a JSON value's runtime type
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered set of uniquely named fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentShape {
    fields: Vec<FieldSpec>,
}

impl ArgumentShape {
    /// Shape with no fields
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a shape, rejecting duplicate field names
    pub fn from_fields(fields: Vec<FieldSpec>) -> std::result::Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(RegistryError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a raw argument mapping. Absent arguments and JSON `null`
    /// are treated as an empty mapping.
    pub fn validate(
        &self,
        raw: Option<&Value>,
    ) -> std::result::Result<ValidatedArguments, ValidationError> {
        let empty = Map::new();
        let raw = match raw {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(other) => return Err(ValidationError::NotAnObject(json_type_name(other))),
        };

        let mut values = Map::new();
        for field in &self.fields {
            match raw.get(&field.name) {
                None | Some(Value::Null) => {
                    if let Some(default) = &field.default {
                        values.insert(field.name.clone(), default.clone());
                    } else if !field.optional {
                        return Err(ValidationError::MissingField(field.name.clone()));
                    }
                }
                Some(value) => {
                    values.insert(field.name.clone(), field.coerce(value)?);
                }
            }
        }

        Ok(ValidatedArguments { values })
    }

    /// Per-field JSON Schema properties, in declaration order
    pub fn property_schemas(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|field| (field.name.clone(), field.property_schema()))
            .collect()
    }

    /// Names of fields without the optional flag
    pub fn required_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|field| !field.optional)
            .map(|field| field.name.clone())
            .collect()
    }
}

/// Arguments that passed validation, with defaults applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArguments {
    values: Map<String, Value>,
}

impl ValidatedArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    /// String field that validation guarantees is present
    pub fn required_str(&self, name: &str) -> std::result::Result<&str, HandlerError> {
        self.str(name).ok_or_else(|| missing(name))
    }

    /// Number field that validation guarantees is present
    pub fn required_number(&self, name: &str) -> std::result::Result<f64, HandlerError> {
        self.number(name).ok_or_else(|| missing(name))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

fn missing(name: &str) -> HandlerError {
    HandlerError::Unexpected(anyhow::anyhow!("validated argument '{}' is missing", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator_shape() -> ArgumentShape {
        ArgumentShape::from_fields(vec![
            FieldSpec::enumeration("operation", &["add", "subtract", "multiply", "divide"]),
            FieldSpec::number("a"),
            FieldSpec::number("b"),
            FieldSpec::number("precision")
                .range(Some(0.0), Some(10.0))
                .with_default(2),
        ])
        .unwrap()
    }

    #[test]
    fn test_valid_arguments_with_default() {
        let shape = calculator_shape();
        let args = shape
            .validate(Some(&json!({"operation": "add", "a": 15, "b": 27})))
            .unwrap();

        assert_eq!(args.str("operation"), Some("add"));
        assert_eq!(args.number("a"), Some(15.0));
        assert_eq!(args.number("precision"), Some(2.0));
    }

    #[test]
    fn test_missing_and_null_fields() {
        let shape = calculator_shape();

        let err = shape
            .validate(Some(&json!({"operation": "add", "a": 1})))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("b".to_string()));

        let err = shape
            .validate(Some(&json!({"operation": "add", "a": 1, "b": null})))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("b".to_string()));

        let err = shape.validate(None).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("operation".to_string()));
    }

    #[test]
    fn test_type_mismatch_and_coercion() {
        let shape = calculator_shape();

        let args = shape
            .validate(Some(&json!({"operation": "add", "a": "1.5", "b": 2})))
            .unwrap();
        assert_eq!(args.number("a"), Some(1.5));

        let err = shape
            .validate(Some(&json!({"operation": "add", "a": "one", "b": 2})))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                field: "a".to_string(),
                expected: "number",
                actual: "string",
            }
        );

        let err = shape
            .validate(Some(&json!({"operation": "add", "a": "inf", "b": 2})))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { .. }));

        let flags = ArgumentShape::from_fields(vec![FieldSpec::boolean("flag")]).unwrap();
        let args = flags.validate(Some(&json!({"flag": "true"}))).unwrap();
        assert_eq!(args.boolean("flag"), Some(true));
        assert!(flags.validate(Some(&json!({"flag": "yes"}))).is_err());
    }

    #[test]
    fn test_enum_and_range() {
        let shape = calculator_shape();

        let err = shape
            .validate(Some(&json!({"operation": "frobnicate", "a": 1, "b": 2})))
            .unwrap_err();
        match err {
            ValidationError::InvalidEnumValue { field, allowed, .. } => {
                assert_eq!(field, "operation");
                assert_eq!(allowed, vec!["add", "subtract", "multiply", "divide"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = shape
            .validate(Some(&json!({"operation": "add", "a": 1, "b": 2, "precision": 11})))
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        let args = shape
            .validate(Some(&json!({"operation": "add", "a": 1, "b": 2, "precision": 10})))
            .unwrap();
        assert_eq!(args.number("precision"), Some(10.0));
    }

    #[test]
    fn test_unknown_fields_and_non_object() {
        let shape = calculator_shape();

        let args = shape
            .validate(Some(&json!({"operation": "add", "a": 1, "b": 2, "extra": true})))
            .unwrap();
        assert!(!args.contains("extra"));

        let err = shape.validate(Some(&json!([1, 2]))).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject("array"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = ArgumentShape::from_fields(vec![
            FieldSpec::string("text"),
            FieldSpec::number("text"),
        ]);
        assert_eq!(result, Err(RegistryError::DuplicateField("text".to_string())));
    }

    #[test]
    fn test_json_schema_projection() {
        let shape = calculator_shape();
        let properties = shape.property_schemas();

        assert_eq!(shape.required_fields(), vec!["operation", "a", "b"]);
        assert_eq!(properties["operation"]["enum"][3], "divide");
        assert_eq!(properties["precision"]["maximum"], json!(10.0));

        let names: Vec<&String> = properties.keys().collect();
        assert_eq!(names, vec!["operation", "a", "b", "precision"]);
    }
}
