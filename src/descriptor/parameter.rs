//! Parameter metadata: declared type, validation and wire key.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Error, Result};

/// Prefix marking a parameter resolved by a named dynamic resolver.
pub const DYNAMIC_SENTINEL: char = '$';

// =============================================================================
// Parameter types
// =============================================================================

/// Declared target type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Text,
    Int,
    Float,
    Bool,
    Uuid,
    TextList,
    Document,
    File,
}

impl ParamType {
    /// Human-readable type name for introspection listings.
    pub fn display_name(&self) -> &'static str {
        match self {
            ParamType::Text => "string",
            ParamType::Int => "integer",
            ParamType::Float => "number",
            ParamType::Bool => "boolean",
            ParamType::Uuid => "uuid",
            ParamType::TextList => "string[]",
            ParamType::Document => "object",
            ParamType::File => "file",
        }
    }
}

/// Validation applied to non-null static values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validation {
    #[default]
    None,
    Uuid,
    Email,
    /// Regular expression the whole value must match.
    Pattern(String),
}

// =============================================================================
// Registration spec
// =============================================================================

/// Parameter declaration attached to a method at registration time.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    key: String,
    param_type: ParamType,
    required: bool,
    default_value: String,
    max_length: Option<usize>,
    validation: Validation,
    description: String,
}

impl ParamSpec {
    pub fn new(key: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            key: key.into(),
            param_type,
            required: false,
            default_value: String::new(),
            max_length: None,
            validation: Validation::None,
            description: String::new(),
        }
    }

    pub fn text(key: impl Into<String>) -> Self {
        Self::new(key, ParamType::Text)
    }

    pub fn int(key: impl Into<String>) -> Self {
        Self::new(key, ParamType::Int)
    }

    pub fn bool(key: impl Into<String>) -> Self {
        Self::new(key, ParamType::Bool)
    }

    pub fn uuid(key: impl Into<String>) -> Self {
        Self::new(key, ParamType::Uuid).validation(Validation::Uuid)
    }

    pub fn file(key: impl Into<String>) -> Self {
        Self::new(key, ParamType::File)
    }

    /// Parameter resolved by the dynamic resolver `name` (`$name` on the wire).
    pub fn dynamic(name: &str) -> Self {
        Self::new(format!("{DYNAMIC_SENTINEL}{name}"), ParamType::Document)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn email(self) -> Self {
        self.validation(Validation::Email)
    }

    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        self.validation(Validation::Pattern(pattern.into()))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Immutable parameter metadata, built once at registration.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    key: String,
    param_type: ParamType,
    required: bool,
    default_value: Option<String>,
    max_length: Option<usize>,
    validation: Validation,
    pattern: Option<Regex>,
    description: String,
}

impl ParameterDescriptor {
    pub(crate) fn build(spec: ParamSpec, method: &str) -> Result<Self> {
        let dynamic_name = spec.key.strip_prefix(DYNAMIC_SENTINEL);
        if spec.key.trim().is_empty() || dynamic_name.map_or(false, |name| name.is_empty()) {
            return Err(Error::registration(format!(
                "Parameter key cannot be empty in method '{}'",
                method
            )));
        }

        let pattern = match &spec.validation {
            Validation::Pattern(source) => Some(Regex::new(&format!("^(?:{source})$")).map_err(
                |e| {
                    Error::registration(format!(
                        "Parameter '{}' of method '{}' has an invalid pattern: {}",
                        spec.key, method, e
                    ))
                },
            )?),
            _ => None,
        };

        let default_value = if spec.default_value.trim().is_empty() {
            None
        } else {
            Some(spec.default_value)
        };

        Ok(Self {
            key: spec.key,
            param_type: spec.param_type,
            required: spec.required,
            default_value,
            max_length: spec.max_length,
            validation: spec.validation,
            pattern,
            description: spec.description,
        })
    }

    /// Key as declared, sentinel included for dynamic parameters.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    /// Compiled, anchored pattern for `Validation::Pattern`.
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_dynamic(&self) -> bool {
        self.key.starts_with(DYNAMIC_SENTINEL)
    }

    pub fn is_static(&self) -> bool {
        !self.is_dynamic()
    }

    /// Resolver name of a dynamic parameter (sentinel stripped).
    pub fn dynamic_name(&self) -> Option<&str> {
        self.key.strip_prefix(DYNAMIC_SENTINEL)
    }

    pub fn is_file(&self) -> bool {
        self.param_type == ParamType::File
    }

    pub(crate) fn describe(&self) -> Value {
        serde_json::json!({
            "key": self.key,
            "type": self.param_type.display_name(),
            "required": self.required,
            "dynamic": self.is_dynamic(),
            "default": self.default_value,
            "maxLength": self.max_length,
            "validation": self.validation,
            "description": self.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_and_dynamic_classification() {
        let name = ParameterDescriptor::build(ParamSpec::text("name"), "find").unwrap();
        assert!(name.is_static());
        assert!(name.dynamic_name().is_none());

        let token = ParameterDescriptor::build(ParamSpec::dynamic("token"), "find").unwrap();
        assert!(token.is_dynamic());
        assert_eq!(token.key(), "$token");
        assert_eq!(token.dynamic_name(), Some("token"));
    }

    #[test]
    fn test_blank_default_is_none() {
        let p = ParameterDescriptor::build(ParamSpec::text("q").default_value("  "), "m").unwrap();
        assert!(p.default_value().is_none());

        let p = ParameterDescriptor::build(ParamSpec::int("limit").default_value("10"), "m").unwrap();
        assert_eq!(p.default_value(), Some("10"));
    }

    #[test]
    fn test_empty_keys_rejected() {
        assert!(ParameterDescriptor::build(ParamSpec::text(""), "m").is_err());
        assert!(ParameterDescriptor::build(ParamSpec::text("$"), "m").is_err());
    }

    #[test]
    fn test_pattern_is_anchored() {
        let p = ParameterDescriptor::build(ParamSpec::text("code").pattern("[a-z]+"), "m").unwrap();
        let re = p.pattern().unwrap();
        assert!(re.is_match("abc"));
        assert!(!re.is_match("abc1"));
    }

    #[test]
    fn test_invalid_pattern_fails_registration() {
        let err = ParameterDescriptor::build(ParamSpec::text("code").pattern("(unclosed"), "m")
            .unwrap_err();
        assert!(matches!(err, Error::Registration(_)));
    }
}
