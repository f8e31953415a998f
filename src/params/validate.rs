//! Length and validation-mode checks for static textual values.

use regex::Regex;
use std::sync::OnceLock;

use crate::descriptor::{ParameterDescriptor, Validation};
use crate::types::{Error, Result};

static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();

fn email_regex() -> Option<&'static Regex> {
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").ok()
        })
        .as_ref()
}

/// Hyphenated UUID check.
pub fn is_uuid(value: &str) -> bool {
    value.len() == 36 && uuid::Uuid::parse_str(value).is_ok()
}

pub fn is_email(value: &str) -> bool {
    email_regex().map_or(false, |re| re.is_match(value))
}

/// Reject values longer than the declared maximum (measured in characters).
pub(crate) fn check_length(param: &ParameterDescriptor, value: &str) -> Result<()> {
    let Some(max) = param.max_length() else {
        return Ok(());
    };
    let length = value.chars().count();
    if length > max {
        return Err(Error::parameter_too_long(format!(
            "Parameter '{}' has a max length of {} but is {}",
            param.key(),
            max,
            length
        )));
    }
    Ok(())
}

/// Run the parameter's validation mode against a non-null value.
pub(crate) fn check_validation(param: &ParameterDescriptor, value: &str) -> Result<()> {
    let valid = match param.validation() {
        Validation::None => true,
        Validation::Uuid => is_uuid(value),
        Validation::Email => is_email(value),
        Validation::Pattern(_) => param.pattern().map_or(false, |re| re.is_match(value)),
    };
    if valid {
        return Ok(());
    }

    let expected = match param.validation() {
        Validation::Uuid => "a UUID".to_string(),
        Validation::Email => "an email address".to_string(),
        Validation::Pattern(pattern) => format!("of pattern {}", pattern),
        Validation::None => String::new(),
    };
    Err(Error::invalid_parameter(format!(
        "Parameter '{}' is not {}",
        param.key(),
        expected
    )))
}
