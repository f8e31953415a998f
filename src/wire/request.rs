//! Transport-neutral inbound request.

use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;

/// One part of a multipart body, already decoded by the transport.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Part {
    /// Plain form field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: Bytes::from(value.into()),
        }
    }

    /// Uploaded file.
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data: data.into(),
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Request body as handed over by the transport.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Bytes),
    Multipart(Vec<Part>),
}

/// Inbound request: verb, path, headers, query/form table and body.
#[derive(Debug, Clone)]
pub struct Request {
    verb: String,
    path: String,
    headers: HashMap<String, String>,
    params: HashMap<String, String>,
    body: Body,
}

impl Request {
    pub fn new(verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            headers: HashMap::new(),
            params: HashMap::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Header names are matched case-insensitively.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Query or form parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// JSON body with the matching content type.
    pub fn json(self, value: &Value) -> Self {
        self.header("content-type", "application/json")
            .body(Body::Bytes(Bytes::from(value.to_string())))
    }

    /// Multipart body with the matching content type.
    pub fn multipart(self, parts: Vec<Part>) -> Self {
        self.header("content-type", "multipart/form-data")
            .body(Body::Multipart(parts))
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn body_ref(&self) -> &Body {
        &self.body
    }

    /// Content type without parameters, lower-cased.
    pub fn content_type(&self) -> Option<String> {
        self.header_value("content-type").map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// JSON-like structured body (`application/json`, `text/plain`, `*+json`).
    pub fn is_structured(&self) -> bool {
        self.content_type().map_or(false, |ct| {
            ct == "application/json" || ct == "text/plain" || ct.ends_with("+json")
        })
    }

    pub fn is_multipart(&self) -> bool {
        self.content_type()
            .map_or(false, |ct| ct.starts_with("multipart/"))
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        match &self.body {
            Body::Multipart(parts) => parts.iter().find(|p| p.name == name),
            _ => None,
        }
    }

    /// `VERB /path`, used to identify the request in logs.
    pub fn target(&self) -> String {
        format!("{} {}", self.verb, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_case_insensitive() {
        let request = Request::get("/users/find").header("Authorization", "Bearer abc");
        assert_eq!(request.header_value("authorization"), Some("Bearer abc"));
        assert_eq!(request.header_value("AUTHORIZATION"), Some("Bearer abc"));
    }

    #[test]
    fn test_content_type_classification() {
        let request = Request::post("/a/b").header("Content-Type", "application/json; charset=UTF-8");
        assert_eq!(request.content_type().as_deref(), Some("application/json"));
        assert!(request.is_structured());
        assert!(!request.is_multipart());

        let request = Request::post("/a/b").multipart(vec![Part::text("name", "ali")]);
        assert!(request.is_multipart());
        assert_eq!(request.part("name").unwrap().size(), 3);
        assert!(request.part("other").is_none());

        assert!(!Request::get("/a/b").is_structured());
    }
}
