//! Per-request context: the request plus request-scoped caches.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::request::{Body, Request};
use crate::transaction::TransactionScope;
use crate::types::{Error, RequestId, Result};

/// State owned by one in-flight request.
///
/// Holds the parse-once cache of the structured body and the decoded text of
/// multipart parts. Never shared across requests.
#[derive(Debug)]
pub struct RequestContext {
    id: RequestId,
    request: Request,
    scope: TransactionScope,
    cancel: CancellationToken,
    json: Option<Arc<Map<String, Value>>>,
    part_text: HashMap<String, Option<String>>,
}

impl RequestContext {
    pub fn new(request: Request) -> Self {
        Self {
            id: RequestId::new(),
            request,
            scope: TransactionScope::new(),
            cancel: CancellationToken::new(),
            json: None,
            part_text: HashMap::new(),
        }
    }

    /// Join an existing transaction scope (nested calls).
    pub fn with_scope(mut self, scope: TransactionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Token the transport fires when the request is abandoned.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn scope(&self) -> &TransactionScope {
        &self.scope
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header_value(name)
    }

    pub fn target(&self) -> String {
        self.request.target()
    }

    /// Structured body as a JSON object, parsed once per request.
    ///
    /// An empty body is an empty object; anything that is not a JSON object
    /// is an `InvalidParameter`.
    pub fn json_body(&mut self) -> Result<Arc<Map<String, Value>>> {
        if let Some(cached) = &self.json {
            return Ok(Arc::clone(cached));
        }

        let raw: &[u8] = match self.request.body_ref() {
            Body::Bytes(bytes) => bytes,
            _ => &[],
        };
        let parsed = if raw.iter().all(u8::is_ascii_whitespace) {
            Map::new()
        } else {
            match serde_json::from_slice::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => return Err(Error::invalid_parameter("Request body must be a JSON object")),
                Err(e) => {
                    return Err(Error::invalid_parameter(format!(
                        "Request body is not valid JSON: {}",
                        e
                    )))
                }
            }
        };
        tracing::debug!(request_id = %self.id, keys = parsed.len(), "Parsed structured body");

        let parsed = Arc::new(parsed);
        self.json = Some(Arc::clone(&parsed));
        Ok(parsed)
    }

    /// Text of a non-file multipart part, decoded once per request.
    pub fn part_text(&mut self, name: &str) -> Result<Option<String>> {
        if let Some(cached) = self.part_text.get(name) {
            return Ok(cached.clone());
        }

        let text = match self.request.part(name) {
            Some(part) => Some(String::from_utf8(part.data.to_vec()).map_err(|_| {
                Error::invalid_parameter(format!("Part '{}' is not valid UTF-8 text", name))
            })?),
            None => None,
        };
        self.part_text.insert(name.to_string(), text.clone());
        Ok(text)
    }
}
