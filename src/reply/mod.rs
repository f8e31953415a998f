//! Everything a method may return, before encoding.

mod stream;

pub use stream::{FileResult, StreamResult};

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::outcome::{Either, Fault, ServiceError, ServiceResult};
use crate::types::Result;

/// Object -> document conversion used for domain values.
pub trait ToDocument: Send + Sync {
    fn to_document(&self) -> Result<Value>;
}

impl<T: Serialize + Send + Sync> ToDocument for T {
    fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Return value of a method, unwrapped by the encoder.
pub enum Reply {
    /// Encoded as an empty JSON response.
    Null,
    /// Raw document, passed through unchanged.
    Document(Value),
    /// Domain value converted through [`ToDocument`].
    Object(Box<dyn ToDocument>),
    /// Optional container; `None` encodes like `Null`.
    Optional(Option<Box<Reply>>),
    /// Soft-error wrapper.
    Outcome(ServiceResult<Box<Reply>, Fault>),
    /// First-or-second union; a selected `Error` branch is encoded as an error.
    Either(Either<Box<Reply>, Box<Reply>>),
    /// Error value with its own code and status.
    Error(Fault),
    /// Binary stream.
    Stream(Box<dyn StreamResult>),
}

impl Reply {
    pub fn object<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Reply::Object(Box::new(value))
    }

    pub fn optional<T: Into<Reply>>(value: Option<T>) -> Self {
        Reply::Optional(value.map(|v| Box::new(v.into())))
    }

    pub fn outcome<T, E>(result: ServiceResult<T, E>) -> Self
    where
        T: Into<Reply>,
        E: Into<Fault>,
    {
        Reply::Outcome(match result {
            ServiceResult::Success(value) => ServiceResult::Success(Box::new(value.into())),
            ServiceResult::Error(error) => ServiceResult::Error(error.into()),
        })
    }

    pub fn either<A: Into<Reply>, B: Into<Reply>>(value: Either<A, B>) -> Self {
        Reply::Either(match value {
            Either::First(a) => Either::First(Box::new(a.into())),
            Either::Second(b) => Either::Second(Box::new(b.into())),
        })
    }

    pub fn error(error: impl Into<Fault>) -> Self {
        Reply::Error(error.into())
    }

    pub fn stream<S: StreamResult + 'static>(stream: S) -> Self {
        Reply::Stream(Box::new(stream))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Null => "null",
            Reply::Document(_) => "document",
            Reply::Object(_) => "object",
            Reply::Optional(_) => "optional",
            Reply::Outcome(_) => "outcome",
            Reply::Either(_) => "either",
            Reply::Error(_) => "error",
            Reply::Stream(_) => "stream",
        }
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Document(value) => f.debug_tuple("Document").field(value).finish(),
            Reply::Optional(value) => f.debug_tuple("Optional").field(value).finish(),
            Reply::Error(fault) => f.debug_tuple("Error").field(fault).finish(),
            other => write!(f, "Reply::{}", other.kind()),
        }
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Null
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Document(value)
    }
}

impl From<ServiceError> for Reply {
    fn from(error: ServiceError) -> Self {
        Reply::Error(error.into())
    }
}

impl From<Fault> for Reply {
    fn from(fault: Fault) -> Self {
        Reply::Error(fault)
    }
}

impl From<FileResult> for Reply {
    fn from(file: FileResult) -> Self {
        Reply::stream(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct User {
        name: String,
    }

    #[test]
    fn test_object_converts_through_serde() {
        let reply = Reply::object(User {
            name: "ali".to_string(),
        });
        let Reply::Object(object) = reply else {
            panic!("expected object");
        };
        assert_eq!(object.to_document().unwrap(), json!({"name": "ali"}));
    }

    #[test]
    fn test_wrappers() {
        assert!(matches!(Reply::optional(None::<Value>), Reply::Optional(None)));
        assert!(matches!(
            Reply::outcome(ServiceResult::<Value, ServiceError>::of_error(ServiceError::not_found("x"))),
            Reply::Outcome(ServiceResult::Error(_))
        ));
        assert!(matches!(
            Reply::either(Either::<Value, ServiceError>::Second(ServiceError::forbidden("x"))),
            Reply::Either(Either::Second(_))
        ));
    }
}
