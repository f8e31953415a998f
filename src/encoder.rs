//! Response and error encoding.
//!
//! Replies are unwrapped (optional, soft-error, either) until a stream or a
//! document remains. Failures are written as the error envelope
//! `{"error", "errorClass", "errorCode"}` unless the response is already
//! committed.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::outcome::{ErrorCode, ServiceResult};
use crate::reply::{Reply, StreamResult};
use crate::types::{Error, Result};
use crate::wire::Response;

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// `Cache-Control` value for a ttl in seconds.
pub fn cache_control(ttl: u32) -> String {
    if ttl > 0 {
        format!("public, max-age={}", ttl)
    } else {
        "private".to_string()
    }
}

/// Strip line breaks from an error message.
pub fn sanitize_message(message: &str) -> String {
    message.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Wire form of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub error: String,
    pub error_class: String,
    pub error_code: String,
}

impl ErrorEnvelope {
    pub fn from_error(error: &dyn ErrorCode) -> Self {
        Self {
            error: sanitize_message(&error.message()),
            error_class: error.error_class(),
            error_code: error.error_code(),
        }
    }
}

/// Encode a method's reply. A reply that resolves to an error value comes
/// back as `Err` so the caller routes it through [`encode_error`].
pub async fn encode_reply(response: &mut Response, reply: Reply, ttl: u32) -> Result<()> {
    let mut reply = reply;
    loop {
        reply = match reply {
            Reply::Optional(Some(inner)) => *inner,
            Reply::Optional(None) | Reply::Null => return write_json(response, None, ttl),
            Reply::Outcome(ServiceResult::Success(inner)) => *inner,
            Reply::Outcome(ServiceResult::Error(fault)) | Reply::Error(fault) => {
                return Err(Error::Invocation(fault));
            }
            Reply::Either(either) => *either.first_or_second(),
            Reply::Stream(stream) => return write_stream(response, stream.as_ref()).await,
            Reply::Document(value) => return write_json(response, Some(value), ttl),
            Reply::Object(object) => {
                let value = object.to_document()?;
                return write_json(response, Some(value), ttl);
            }
        };
    }
}

fn write_json(response: &mut Response, value: Option<Value>, ttl: u32) -> Result<()> {
    response.set_header("Cache-Control", cache_control(ttl));
    response.set_header("Content-Type", JSON_CONTENT_TYPE);
    match value {
        Some(value) => {
            let bytes = serde_json::to_vec(&value)?;
            response.write(&bytes);
        }
        None => response.commit(),
    }
    Ok(())
}

async fn write_stream(response: &mut Response, stream: &dyn StreamResult) -> Result<()> {
    response.set_header("Cache-Control", cache_control(stream.ttl()));
    let content_type = match stream.encoding() {
        Some(encoding) => format!("{}; charset={}", stream.mime_type(), encoding),
        None => stream.mime_type().to_string(),
    };
    response.set_header("Content-Type", content_type);
    let disposition = if stream.is_inline() { "inline" } else { "attachment" };
    let header = match stream.file_name() {
        Some(name) => format!("{}; filename=\"{}\"", disposition, name.replace('"', "")),
        None => disposition.to_string(),
    };
    response.set_header("Content-Disposition", header);

    let written = stream.stream(&mut response.sink()).await?;
    response.commit();
    debug!(bytes = written, mime = %stream.mime_type(), "Sent streamed response");
    Ok(())
}

/// Log a failure and, if the response has not started, write the envelope
/// with the failure's own status.
pub fn encode_error(target: &str, response: &mut Response, failure: &dyn ErrorCode) {
    let status = failure.http_status();
    let code = failure.error_code();
    if status >= 500 {
        error!(target_path = %target, status, code = %code, error = %failure.message(), "Request failed");
    } else {
        debug!(target_path = %target, status, code = %code, error = %failure.message(), "Request rejected");
    }

    if response.is_committed() {
        debug!(target_path = %target, "Response already committed, error envelope not sent");
        return;
    }

    let envelope = ErrorEnvelope::from_error(failure);
    response.set_status(status);
    response.set_header("Cache-Control", "private");
    response.set_header("Content-Type", JSON_CONTENT_TYPE);
    match serde_json::to_vec(&envelope) {
        Ok(bytes) => response.write(&bytes),
        Err(e) => error!(target_path = %target, error = %e, "Error writing error response"),
    }
}
