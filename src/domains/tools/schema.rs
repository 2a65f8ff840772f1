//! Declarative parameter schemas and their runtime validation.
//!
//! Every tool declares its parameters as an ordered [`ParameterSchema`]. The
//! same declaration drives two things:
//! - the JSON Schema advertised to clients (`tools/list`, `/debug/tools`)
//! - validation and default substitution before a handler runs
//!
//! Validation is strict: a value of the wrong JSON type is rejected rather than
//! coerced, so `"5"` is never accepted where a number is declared.

use serde_json::{Map, Value, json};
use thiserror::Error;

/// The scalar kinds a tool parameter can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
    /// A string restricted to a fixed set of values.
    Enum(Vec<String>),
    /// Any JSON value is accepted as-is.
    Any,
}

impl ParameterKind {
    /// JSON Schema `type` keyword for this kind, if it has one.
    pub fn json_type(&self) -> Option<&'static str> {
        match self {
            Self::String | Self::Enum(_) => Some("string"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Any => None,
        }
    }

    /// Human-readable name used in validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Enum(_) => "enum string",
            Self::Any => "any",
        }
    }
}

/// Errors produced while validating tool arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required parameter '{name}'")]
    MissingRequiredParameter { name: String },

    #[error("Parameter '{name}' must be a {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Parameter '{name}' must be one of [{}], got '{value}'", allowed.join(", "))]
    InvalidEnumValue {
        name: String,
        value: String,
        allowed: Vec<String>,
    },
}

/// Specification of a single tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub kind: ParameterKind,
    pub required: bool,
    pub default: Option<Value>,
    pub description: String,
}

impl ParameterSpec {
    fn new(kind: ParameterKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            description: description.into(),
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(ParameterKind::String, description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::new(ParameterKind::Number, description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(ParameterKind::Boolean, description)
    }

    pub fn any(description: impl Into<String>) -> Self {
        Self::new(ParameterKind::Any, description)
    }

    pub fn one_of<I, S>(allowed: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            ParameterKind::Enum(allowed.into_iter().map(Into::into).collect()),
            description,
        )
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value substituted when the caller omits the parameter.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Validate a raw argument against this spec.
    ///
    /// Returns `Ok(None)` when an optional parameter without a default is
    /// absent. JSON `null` is treated the same as an absent value.
    pub fn validate(&self, name: &str, raw: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        let value = match raw {
            None | Some(Value::Null) => {
                return match (&self.default, self.required) {
                    (Some(default), _) => Ok(Some(default.clone())),
                    (None, true) => Err(ValidationError::MissingRequiredParameter {
                        name: name.to_string(),
                    }),
                    (None, false) => Ok(None),
                };
            }
            Some(value) => value,
        };

        let mismatch = || ValidationError::TypeMismatch {
            name: name.to_string(),
            expected: self.kind.label(),
            found: json_type_name(value),
        };

        match &self.kind {
            ParameterKind::String if value.is_string() => Ok(Some(value.clone())),
            ParameterKind::Number if value.is_number() => Ok(Some(value.clone())),
            ParameterKind::Boolean if value.is_boolean() => Ok(Some(value.clone())),
            ParameterKind::Any => Ok(Some(value.clone())),
            ParameterKind::Enum(allowed) => {
                let text = value.as_str().ok_or_else(mismatch)?;
                if allowed.iter().any(|a| a == text) {
                    Ok(Some(value.clone()))
                } else {
                    Err(ValidationError::InvalidEnumValue {
                        name: name.to_string(),
                        value: text.to_string(),
                        allowed: allowed.clone(),
                    })
                }
            }
            ParameterKind::String | ParameterKind::Number | ParameterKind::Boolean => Err(mismatch()),
        }
    }

    /// JSON Schema fragment describing this parameter.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        if let Some(ty) = self.kind.json_type() {
            schema.insert("type".into(), json!(ty));
        }
        if let ParameterKind::Enum(allowed) = &self.kind {
            schema.insert("enum".into(), json!(allowed));
        }
        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }
        if !self.description.is_empty() {
            schema.insert("description".into(), json!(self.description));
        }
        Value::Object(schema)
    }
}

/// Ordered parameter declarations of a tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    params: Vec<(String, ParameterSpec)>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter declaration.
    pub fn param(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.params.push((name.into(), spec));
        self
    }

    /// Validate raw arguments, stopping at the first failing parameter.
    ///
    /// Parameters are checked in declaration order. Arguments that are not
    /// declared are dropped from the result.
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<ValidatedArgs, ValidationError> {
        let mut values = Map::new();
        for (name, spec) in &self.params {
            if let Some(value) = spec.validate(name, raw.get(name))? {
                values.insert(name.clone(), value);
            }
        }
        Ok(ValidatedArgs { values })
    }

    /// JSON Schema object (`type: object`) for the whole parameter list.
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|(name, spec)| (name.clone(), spec.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema
    }
}

/// Arguments that passed validation, with defaults already applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs {
    values: Map<String, Value>,
}

impl ValidatedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    /// Fetch a string the schema declared as required.
    pub fn require_str(&self, name: &str) -> Result<&str, super::ToolError> {
        self.str(name)
            .ok_or_else(|| super::ToolError::internal(format!("validated argument '{name}' is missing")))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_required_missing() {
        let spec = ParameterSpec::string("message").required();
        assert_eq!(
            spec.validate("msg", None),
            Err(ValidationError::MissingRequiredParameter { name: "msg".into() })
        );
    }

    #[test]
    fn test_null_is_absent() {
        let spec = ParameterSpec::string("name").with_default("Developer");
        assert_eq!(spec.validate("name", Some(&Value::Null)), Ok(Some(json!("Developer"))));
    }

    #[test]
    fn test_required_with_default_uses_default() {
        let spec = ParameterSpec::number("ttl").required().with_default(3600);
        assert_eq!(spec.validate("ttl", None), Ok(Some(json!(3600))));
    }

    #[test]
    fn test_optional_absent_passes_through() {
        let spec = ParameterSpec::string("cwd");
        assert_eq!(spec.validate("cwd", None), Ok(None));
    }

    #[test]
    fn test_strict_type_mismatch() {
        let spec = ParameterSpec::number("ttl");
        let err = spec.validate("ttl", Some(&json!("5"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                name: "ttl".into(),
                expected: "number",
                found: "string"
            }
        );

        let spec = ParameterSpec::boolean("recursive");
        assert!(spec.validate("recursive", Some(&json!(1))).is_err());
    }

    #[test]
    fn test_enum_membership() {
        let spec = ParameterSpec::one_of(["public", "private"], "source").with_default("public");
        assert_eq!(spec.validate("source", Some(&json!("private"))), Ok(Some(json!("private"))));
        assert!(matches!(
            spec.validate("source", Some(&json!("secret"))),
            Err(ValidationError::InvalidEnumValue { .. })
        ));
        assert!(matches!(
            spec.validate("source", Some(&json!(3))),
            Err(ValidationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_any_accepts_everything() {
        let spec = ParameterSpec::any("payload");
        assert_eq!(spec.validate("payload", Some(&json!([1, 2]))), Ok(Some(json!([1, 2]))));
    }

    #[test]
    fn test_schema_fails_fast_in_declaration_order() {
        let schema = ParameterSchema::new()
            .param("a", ParameterSpec::string("first").required())
            .param("b", ParameterSpec::number("second").required());

        let err = schema.validate(&args(json!({ "b": "oops" }))).unwrap_err();
        assert_eq!(err, ValidationError::MissingRequiredParameter { name: "a".into() });
    }

    #[test]
    fn test_schema_drops_undeclared_and_applies_defaults() {
        let schema = ParameterSchema::new()
            .param("directory", ParameterSpec::string("dir").with_default("."))
            .param("recursive", ParameterSpec::boolean("walk").with_default(false));

        let validated = schema
            .validate(&args(json!({ "recursive": true, "extra": 1 })))
            .unwrap();
        assert_eq!(validated.str("directory"), Some("."));
        assert_eq!(validated.bool("recursive"), Some(true));
        assert!(validated.get("extra").is_none());
    }

    #[test]
    fn test_json_schema_shape() {
        let schema = ParameterSchema::new()
            .param("query", ParameterSpec::string("Search query").required())
            .param(
                "source",
                ParameterSpec::one_of(["public", "private"], "").with_default("public"),
            );

        let json = Value::Object(schema.to_json_schema());
        assert_eq!(json["type"], "object");
        assert_eq!(json["required"], json!(["query"]));
        assert_eq!(json["properties"]["query"]["type"], "string");
        assert_eq!(json["properties"]["source"]["enum"], json!(["public", "private"]));
        assert_eq!(json["properties"]["source"]["default"], "public");
        assert!(json["properties"]["source"].get("description").is_none());
    }
}
