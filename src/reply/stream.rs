//! Binary stream results.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::types::{Error, Result};

/// Value that is written to the response as raw bytes.
#[async_trait]
pub trait StreamResult: Send + Sync {
    /// Cache lifetime in seconds (0 = private).
    fn ttl(&self) -> u32;

    fn mime_type(&self) -> &str;

    /// Character encoding, for textual payloads.
    fn encoding(&self) -> Option<&str> {
        None
    }

    fn file_name(&self) -> Option<&str> {
        None
    }

    /// Inline or attachment disposition.
    fn is_inline(&self) -> bool {
        true
    }

    /// Write the payload to `sink`. Returns the number of bytes written.
    async fn stream(&self, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> Result<u64>;
}

/// MIME type guessed from a file extension.
fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "txt" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "xml" => "text/xml",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

fn encoding_for(mime_type: &str) -> Option<String> {
    mime_type.starts_with("text").then(|| "UTF-8".to_string())
}

/// Stream result over a regular file on disk.
#[derive(Debug, Clone)]
pub struct FileResult {
    path: PathBuf,
    ttl: u32,
    inline: bool,
    file_name: String,
    mime_type: String,
    encoding: Option<String>,
}

impl FileResult {
    /// Fails unless `path` is a regular file. Inline by default; the MIME
    /// type is guessed from the extension.
    pub async fn new(path: impl Into<PathBuf>, ttl: u32) -> Result<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await.ok();
        if !metadata.map_or(false, |m| m.is_file()) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File '{}' does not exist", path.display()),
            )));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = Path::new(&file_name)
            .extension()
            .map(|ext| mime_for_extension(&ext.to_string_lossy()))
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Self {
            encoding: encoding_for(&mime_type),
            path,
            ttl,
            inline: true,
            file_name,
            mime_type,
        })
    }

    pub fn attachment(mut self) -> Self {
        self.inline = false;
        self
    }

    /// File name presented to the client.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self.encoding = encoding_for(&self.mime_type);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lower-cased extension of the presented file name.
    pub fn file_extension(&self) -> String {
        self.file_name
            .rfind('.')
            .map(|i| self.file_name[i + 1..].to_ascii_lowercase())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StreamResult for FileResult {
    fn ttl(&self) -> u32 {
        self.ttl
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    fn file_name(&self) -> Option<&str> {
        Some(&self.file_name)
    }

    fn is_inline(&self) -> bool {
        self.inline
    }

    async fn stream(&self, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> Result<u64> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        let written = tokio::io::copy(&mut file, sink).await?;
        sink.flush().await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_file_gets_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.TXT");
        tokio::fs::write(&path, "hello").await.unwrap();

        let result = FileResult::new(&path, 60).await.unwrap();
        assert_eq!(result.mime_type(), "text/plain");
        assert_eq!(result.encoding(), Some("UTF-8"));
        assert_eq!(result.file_name(), Some("notes.TXT"));
        assert_eq!(result.file_extension(), "txt");
        assert!(result.is_inline());

        let mut sink = Vec::new();
        assert_eq!(result.stream(&mut sink).await.unwrap(), 5);
        assert_eq!(sink, b"hello");
    }

    #[tokio::test]
    async fn test_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        tokio::fs::write(&path, [1u8, 2, 3]).await.unwrap();

        let result = FileResult::new(&path, 0).await.unwrap();
        assert_eq!(result.mime_type(), "application/octet-stream");
        assert!(result.encoding().is_none());

        let result = result
            .attachment()
            .with_file_name("report.csv")
            .with_mime_type("text/csv");
        assert!(!result.is_inline());
        assert_eq!(result.file_name(), Some("report.csv"));
        assert_eq!(result.encoding(), Some("UTF-8"));
    }

    #[tokio::test]
    async fn test_missing_or_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileResult::new(dir.path().join("missing.txt"), 0).await.is_err());
        assert!(FileResult::new(dir.path(), 0).await.is_err());
    }
}
