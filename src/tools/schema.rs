//! Declared argument schemas for tools
//!
//! Argument keys are matched exactly against the declared parameters:
//! no renaming, no case folding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Expected JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// Any JSON value, including null
    Any,
}

impl ParamKind {
    /// Check whether a value satisfies this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Array => value.is_array(),
            ParamKind::Object => value.is_object(),
            ParamKind::Any => true,
        }
    }

    /// Name used in prompts and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
            ParamKind::Any => "any",
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_required() -> bool {
    true
}

impl ParameterSpec {
    /// Create a required parameter
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
        }
    }

    /// Create an optional parameter
    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
        }
    }

    /// Attach a human-readable description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Check an argument mapping against a declared schema.
///
/// Returns a diagnostic listing every problem found, or `Ok(())` when the
/// mapping matches. Problems are reported in schema order, then unknown
/// keys in the mapping's own order.
pub fn validate_args(params: &[ParameterSpec], args: &Map<String, Value>) -> Result<(), String> {
    let mut problems = Vec::new();

    for param in params {
        match args.get(&param.name) {
            None if param.required => {
                problems.push(format!("missing required argument '{}'", param.name));
            }
            None => {}
            Some(value) if !param.kind.accepts(value) => {
                problems.push(format!(
                    "argument '{}' must be of type {}",
                    param.name, param.kind
                ));
            }
            Some(_) => {}
        }
    }

    for key in args.keys() {
        if !params.iter().any(|p| &p.name == key) {
            problems.push(format!("unrecognized argument '{}'", key));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn schema() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("location", ParamKind::String),
            ParameterSpec::optional("days", ParamKind::Integer),
        ]
    }

    #[test]
    fn test_accepts_exact_match() {
        assert!(validate_args(&schema(), &args(json!({"location": "Tokyo"}))).is_ok());
        assert!(validate_args(&schema(), &args(json!({"location": "Tokyo", "days": 3}))).is_ok());
    }

    #[test]
    fn test_rejects_missing_required() {
        let err = validate_args(&schema(), &args(json!({"days": 3}))).unwrap_err();
        assert!(err.contains("missing required argument 'location'"));
    }

    #[test]
    fn test_rejects_case_mismatch_as_unknown_key() {
        let err = validate_args(&schema(), &args(json!({"Location": "Tokyo"}))).unwrap_err();
        assert!(err.contains("missing required argument 'location'"));
        assert!(err.contains("unrecognized argument 'Location'"));
    }

    #[test]
    fn test_rejects_wrong_type() {
        let err =
            validate_args(&schema(), &args(json!({"location": "Tokyo", "days": "three"})))
                .unwrap_err();
        assert_eq!(err, "argument 'days' must be of type integer");
    }

    #[test]
    fn test_any_accepts_null() {
        let params = vec![ParameterSpec::required("payload", ParamKind::Any)];
        assert!(validate_args(&params, &args(json!({"payload": null}))).is_ok());
    }
}
