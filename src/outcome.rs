//! Outcome types a service method can produce besides a plain value.
//!
//! - [`ErrorCode`]: capability of an error to self-report its wire code and HTTP status
//! - [`ServiceResult`]: soft-error wrapper, exactly one of success or error
//! - [`Either`]: first-or-second union, an error-code branch is encoded as an error
//! - [`ServiceError`]: plain error value carrying code and status
//! - [`Fault`]: failure raised by a method body, keeps the original error

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Errors that know how they appear on the wire.
pub trait ErrorCode {
    /// Human readable message.
    fn message(&self) -> String;

    /// Machine readable code, e.g. `PARAMETER_REQUIRED`.
    fn error_code(&self) -> String;

    /// HTTP status the error is sent with.
    fn http_status(&self) -> u16;

    /// Type name reported as `errorClass`.
    fn error_class(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Generic error code for errors without the [`ErrorCode`] capability: the
/// upper-cased simple type name (`std::io::error::Error` -> `ERROR`).
pub fn generic_error_code(type_name: &str) -> String {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_uppercase()
}

// =============================================================================
// ServiceResult
// =============================================================================

/// Soft-error wrapper for methods that signal domain errors without failing.
///
/// Holds exactly one side; the enum makes "both" and "neither" unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceResult<T, E = ServiceError> {
    Success(T),
    Error(E),
}

impl<T, E> ServiceResult<T, E> {
    pub fn of(result: T) -> Self {
        ServiceResult::Success(result)
    }

    pub fn of_error(error: E) -> Self {
        ServiceResult::Error(error)
    }

    pub fn is_result(&self) -> bool {
        matches!(self, ServiceResult::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ServiceResult::Error(_))
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            ServiceResult::Success(value) => Some(value),
            ServiceResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            ServiceResult::Success(_) => None,
            ServiceResult::Error(error) => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResult<U, E> {
        match self {
            ServiceResult::Success(value) => ServiceResult::Success(f(value)),
            ServiceResult::Error(error) => ServiceResult::Error(error),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, E> {
        match self {
            ServiceResult::Success(value) => Ok(value),
            ServiceResult::Error(error) => Err(error),
        }
    }
}

impl<T, E> From<std::result::Result<T, E>> for ServiceResult<T, E> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => ServiceResult::Success(value),
            Err(error) => ServiceResult::Error(error),
        }
    }
}

// =============================================================================
// Either
// =============================================================================

/// First-or-second union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Either<A, B> {
    First(A),
    Second(B),
}

impl<A, B> Either<A, B> {
    pub fn is_first(&self) -> bool {
        matches!(self, Either::First(_))
    }
}

impl<T> Either<T, T> {
    /// Whichever branch is set.
    pub fn first_or_second(self) -> T {
        match self {
            Either::First(value) | Either::Second(value) => value,
        }
    }
}

// =============================================================================
// ServiceError
// =============================================================================

/// Error value with a self-declared code and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ServiceError {
    message: String,
    error_code: String,
    http_status: u16,
}

impl ServiceError {
    pub fn new(message: impl Into<String>, error_code: impl Into<String>, http_status: u16) -> Self {
        Self {
            message: message.into(),
            error_code: error_code.into(),
            http_status,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, "FORBIDDEN", 403)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, "NOT_FOUND", 404)
    }

    /// 500 with the code derived from the error's type name.
    pub fn from_error<E: StdError>(error: &E) -> Self {
        Self::new(
            error.to_string(),
            generic_error_code(std::any::type_name::<E>()),
            500,
        )
    }
}

impl ErrorCode for ServiceError {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn error_code(&self) -> String {
        self.error_code.clone()
    }

    fn http_status(&self) -> u16 {
        self.http_status
    }
}

// =============================================================================
// Fault
// =============================================================================

/// Failure raised by an invoked method.
///
/// Any `std::error::Error + Send + Sync` converts into a `Fault` with `?`.
/// The original error stays reachable through [`Fault::downcast_ref`]; its
/// message and type name are reported unchanged. Errors with the
/// [`ErrorCode`] capability defined in this crate keep their code and status.
#[derive(Debug)]
pub struct Fault {
    message: String,
    error_class: String,
    error_code: String,
    http_status: u16,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Fault {
    /// Fault without an underlying error value.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_class: std::any::type_name::<Self>().to_string(),
            error_code: "FAULT".to_string(),
            http_status: 500,
            source: None,
        }
    }

    /// Fault from an error that declares its own code and status.
    pub fn coded<E>(error: E) -> Self
    where
        E: ErrorCode + StdError + Send + Sync + 'static,
    {
        Self {
            message: ErrorCode::message(&error),
            error_class: error.error_class(),
            error_code: error.error_code(),
            http_status: error.http_status(),
            source: Some(Box::new(error)),
        }
    }

    /// Override the reported status and code.
    pub fn with_status(mut self, http_status: u16, error_code: impl Into<String>) -> Self {
        self.http_status = http_status;
        self.error_code = error_code.into();
        self
    }

    /// The original error, if any.
    pub fn source(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.source.as_ref().and_then(|source| source.downcast_ref::<T>())
    }

    fn from_boxed(error: Box<dyn StdError + Send + Sync>, type_name: &str) -> Self {
        let error = match error.downcast::<crate::Error>() {
            Ok(error) => {
                return match *error {
                    crate::Error::Invocation(fault) => fault,
                    other => Fault::coded(other),
                };
            }
            Err(error) => error,
        };
        let error = match error.downcast::<ServiceError>() {
            Ok(error) => return Fault::coded(*error),
            Err(error) => error,
        };

        Self {
            message: error.to_string(),
            error_class: type_name.to_string(),
            error_code: generic_error_code(type_name),
            http_status: 500,
            source: Some(error),
        }
    }
}

impl<E> From<E> for Fault
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Fault::from_boxed(Box::new(error), std::any::type_name::<E>())
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ErrorCode for Fault {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn error_code(&self) -> String {
        self.error_code.clone()
    }

    fn http_status(&self) -> u16 {
        self.http_status
    }

    fn error_class(&self) -> String {
        self.error_class.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("update of {0} failed")]
    struct UpdateFailed(String);

    #[test]
    fn test_generic_error_code() {
        assert_eq!(generic_error_code("std::io::error::Error"), "ERROR");
        assert_eq!(generic_error_code("my_service::UpdateFailed"), "UPDATEFAILED");
        assert_eq!(generic_error_code("a::Wrapper<b::Inner>"), "WRAPPER");
        assert_eq!(generic_error_code("Plain"), "PLAIN");
    }

    #[test]
    fn test_service_result_sides() {
        let ok: ServiceResult<i32> = ServiceResult::of(5);
        assert!(ok.is_result());
        assert_eq!(ok.result(), Some(&5));
        assert_eq!(ok.clone().map(|v| v * 2).into_result().unwrap(), 10);

        let err: ServiceResult<i32> = ServiceResult::of_error(ServiceError::not_found("gone"));
        assert!(err.is_error());
        assert!(err.result().is_none());
        assert_eq!(err.error().unwrap().http_status(), 404);
    }

    #[test]
    fn test_either_selects_set_branch() {
        let first: Either<&str, &str> = Either::First("a");
        assert!(first.is_first());
        assert_eq!(first.first_or_second(), "a");
        assert_eq!(Either::<&str, &str>::Second("b").first_or_second(), "b");
    }

    #[test]
    fn test_fault_from_plain_error_keeps_type_and_message() {
        let fault: Fault = UpdateFailed("user 7".to_string()).into();
        assert_eq!(fault.message(), "update of user 7 failed");
        assert_eq!(fault.error_code(), "UPDATEFAILED");
        assert_eq!(fault.http_status(), 500);
        assert!(fault.error_class().ends_with("UpdateFailed"));
        assert!(fault.downcast_ref::<UpdateFailed>().is_some());
    }

    #[test]
    fn test_fault_from_coded_errors_keeps_code() {
        let fault: Fault = ServiceError::forbidden("nope").into();
        assert_eq!(fault.http_status(), 403);
        assert_eq!(fault.error_code(), "FORBIDDEN");

        let fault: Fault = crate::Error::invalid_parameter("bad").into();
        assert_eq!(fault.http_status(), 400);
        assert_eq!(fault.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_fault_from_invocation_error_unwraps() {
        let inner = Fault::msg("inner").with_status(409, "CONFLICT");
        let fault: Fault = crate::Error::Invocation(inner).into();
        assert_eq!(fault.error_code(), "CONFLICT");
        assert_eq!(fault.http_status(), 409);
        assert_eq!(fault.message(), "inner");
    }
}
