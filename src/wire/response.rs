//! Transport-neutral outbound response.

use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

use crate::types::Result;

/// Response under construction. Once committed (the first body byte has
/// been written) status and headers are final.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
    committed: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: Vec::new(),
            committed: false,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        if !self.committed {
            self.status = status;
        }
    }

    /// Header names are stored lower-cased.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        if !self.committed {
            self.headers.insert(name.to_ascii_lowercase(), value.into());
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Freeze status and headers.
    pub fn commit(&mut self) {
        self.committed = true;
    }

    /// Append to the body, committing the response.
    pub fn write(&mut self, bytes: &[u8]) {
        self.committed = true;
        self.body.extend_from_slice(bytes);
    }

    /// Body sink for streaming writers. The response commits on the first
    /// non-empty write.
    pub(crate) fn sink(&mut self) -> BodySink<'_> {
        BodySink {
            body: &mut self.body,
            committed: &mut self.committed,
        }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON.
    pub fn body_json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// [`AsyncWrite`] view over a response body.
#[derive(Debug)]
pub(crate) struct BodySink<'a> {
    body: &'a mut Vec<u8>,
    committed: &'a mut bool,
}

impl AsyncWrite for BodySink<'_> {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if !buf.is_empty() {
            *this.committed = true;
            this.body.extend_from_slice(buf);
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_commit_freezes_status_and_headers() {
        let mut response = Response::new();
        response.set_status(201);
        response.set_header("Content-Type", "application/json");
        response.write(b"{}");

        response.set_status(500);
        response.set_header("X-Late", "1");

        assert_eq!(response.status(), 201);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert!(response.header("x-late").is_none());
        assert!(response.is_committed());
        assert_eq!(response.body_json().unwrap(), serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_sink_commits_on_first_byte() {
        let mut response = Response::new();
        {
            let mut sink = response.sink();
            sink.write_all(b"").await.unwrap();
            sink.flush().await.unwrap();
        }
        assert!(!response.is_committed());

        response.sink().write_all(b"abc").await.unwrap();
        assert!(response.is_committed());
        assert_eq!(response.body(), b"abc");
    }
}
