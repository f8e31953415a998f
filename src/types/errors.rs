//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation. Every
//! variant self-reports the HTTP status and machine-readable code it is
//! encoded with (see [`ErrorCode`]).

use thiserror::Error;

use crate::auth::AuthError;
use crate::descriptor::VerbSet;
use crate::outcome::{ErrorCode, Fault};

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the dispatch pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Route does not decompose into `/<service>/<method>` (400).
    #[error("{0}")]
    InvalidPath(String),

    /// No service registered under the requested name (404).
    #[error("{0}")]
    UnknownService(String),

    /// Service exists but has no such method (404).
    #[error("{0}")]
    UnknownMethod(String),

    /// Verb is not in the method's allowed set (405).
    #[error("Method {method} is not allowed - only {allowed}")]
    MethodNotAllowed { method: String, allowed: VerbSet },

    /// Required input missing (400).
    #[error("{0}")]
    ParameterRequired(String),

    /// Input exceeds its declared maximum length (400).
    #[error("{0}")]
    ParameterTooLong(String),

    /// Validation or conversion failure (400).
    #[error("{0}")]
    InvalidParameter(String),

    /// Authentication/authorization failure from the permission validator.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Failure raised by the invoked method body.
    #[error("{0}")]
    Invocation(Fault),

    /// Commit or rollback failed.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// Request was cancelled by the transport.
    #[error("request cancelled: {0}")]
    Cancelled(String),

    /// Service could not be registered (fatal at init).
    #[error("registration failed: {0}")]
    Registration(String),

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Variant name, used to build the wire `errorClass`.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidPath(_) => "InvalidPath",
            Error::UnknownService(_) => "UnknownService",
            Error::UnknownMethod(_) => "UnknownMethod",
            Error::MethodNotAllowed { .. } => "MethodNotAllowed",
            Error::ParameterRequired(_) => "ParameterRequired",
            Error::ParameterTooLong(_) => "ParameterTooLong",
            Error::InvalidParameter(_) => "InvalidParameter",
            Error::Auth(e) => e.kind(),
            Error::Invocation(_) => "Invocation",
            Error::Transaction(_) => "Transaction",
            Error::Cancelled(_) => "Cancelled",
            Error::Registration(_) => "Registration",
            Error::Internal(_) => "Internal",
            Error::Serialization(_) => "Serialization",
            Error::Io(_) => "Io",
        }
    }

    /// True for failures the caller caused (status < 500).
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }
}

impl ErrorCode for Error {
    fn message(&self) -> String {
        match self {
            Error::Invocation(fault) => fault.message(),
            other => other.to_string(),
        }
    }

    fn error_code(&self) -> String {
        let code = match self {
            Error::InvalidPath(_) => "INVALID_PATH",
            Error::UnknownService(_) => "UNKNOWN_SERVICE",
            Error::UnknownMethod(_) => "UNKNOWN_METHOD",
            Error::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Error::ParameterRequired(_) => "PARAMETER_REQUIRED",
            Error::ParameterTooLong(_) => "PARAMETER_TOO_LONG",
            Error::InvalidParameter(_) => "INVALID_PARAMETER",
            Error::Auth(e) => e.error_code(),
            Error::Invocation(fault) => return fault.error_code(),
            Error::Transaction(_) => "TRANSACTION_FAILED",
            Error::Cancelled(_) => "REQUEST_CANCELLED",
            Error::Registration(_) => "REGISTRATION",
            Error::Internal(_) => "INTERNAL",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Io(_) => "IO",
        };
        code.to_string()
    }

    fn http_status(&self) -> u16 {
        match self {
            Error::InvalidPath(_)
            | Error::ParameterRequired(_)
            | Error::ParameterTooLong(_)
            | Error::InvalidParameter(_) => 400,
            Error::UnknownService(_) | Error::UnknownMethod(_) => 404,
            Error::MethodNotAllowed { .. } => 405,
            Error::Auth(e) => e.http_status(),
            Error::Invocation(fault) => fault.http_status(),
            Error::Cancelled(_) => 503,
            Error::Transaction(_)
            | Error::Registration(_)
            | Error::Internal(_)
            | Error::Serialization(_)
            | Error::Io(_) => 500,
        }
    }

    fn error_class(&self) -> String {
        match self {
            Error::Invocation(fault) => fault.error_class(),
            other => format!("{}::{}", module_path!(), other.kind()),
        }
    }
}

// Convenience constructors
impl Error {
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    pub fn unknown_service(msg: impl Into<String>) -> Self {
        Self::UnknownService(msg.into())
    }

    pub fn unknown_method(msg: impl Into<String>) -> Self {
        Self::UnknownMethod(msg.into())
    }

    pub fn method_not_allowed(method: impl Into<String>, allowed: VerbSet) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
            allowed,
        }
    }

    pub fn parameter_required(msg: impl Into<String>) -> Self {
        Self::ParameterRequired(msg.into())
    }

    pub fn parameter_too_long(msg: impl Into<String>) -> Self {
        Self::ParameterTooLong(msg.into())
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        Error::Invocation(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Verb;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::invalid_path("x").http_status(), 400);
        assert_eq!(Error::unknown_service("x").http_status(), 404);
        assert_eq!(Error::unknown_method("x").http_status(), 404);
        assert_eq!(
            Error::method_not_allowed("find", VerbSet::from([Verb::Get])).http_status(),
            405
        );
        assert_eq!(Error::parameter_too_long("x").http_status(), 400);
        assert_eq!(Error::transaction("x").http_status(), 500);
    }

    #[test]
    fn test_codes_and_class() {
        let err = Error::parameter_required("Parameter 'name' is required");
        assert_eq!(err.error_code(), "PARAMETER_REQUIRED");
        assert_eq!(err.message(), "Parameter 'name' is required");
        assert!(err.error_class().ends_with("::ParameterRequired"));
        assert!(err.is_client_error());
        assert!(!Error::internal("boom").is_client_error());
    }

    #[test]
    fn test_method_not_allowed_message_lists_verbs() {
        let err = Error::method_not_allowed("find", VerbSet::from([Verb::Get, Verb::Post]));
        assert_eq!(err.to_string(), "Method find is not allowed - only GET, POST");
    }

    #[test]
    fn test_auth_errors_keep_their_mapping() {
        let err: Error = AuthError::permission_missing("users.read").into();
        assert_eq!(err.http_status(), 403);
        assert_eq!(err.error_code(), "PERMISSION_MISSING");

        let err: Error = AuthError::invalid_credentials("Invalid token").into();
        assert_eq!(err.http_status(), 401);
    }
}
