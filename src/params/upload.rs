//! File uploads: persisting multipart file parts and the reference handed to
//! the invoked method.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::value::ParamValue;
use crate::descriptor::ParameterDescriptor;
use crate::types::{DispatchConfig, Error, Result};
use crate::wire::RequestContext;

/// Reference to a payload persisted on disk.
///
/// Uploaded parts are always persisted to a disposable temp file, so their
/// references are movable: the receiver may consume the file instead of
/// copying it. Removing an unconsumed temp file is the receiver's job
/// ([`FileRef::discard`]).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    path: PathBuf,
    mime_type: Option<String>,
    original_name: Option<String>,
    attributes: HashMap<String, Value>,
    movable: bool,
}

impl FileRef {
    /// Reference to an existing file that must not be moved.
    pub fn new(path: impl Into<PathBuf>, mime_type: Option<String>) -> Self {
        Self {
            path: path.into(),
            mime_type,
            original_name: None,
            attributes: HashMap::new(),
            movable: false,
        }
    }

    pub(crate) fn temporary(path: PathBuf, mime_type: Option<String>, original_name: Option<String>) -> Self {
        Self {
            path,
            mime_type,
            original_name,
            attributes: HashMap::new(),
            movable: true,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// File name as sent by the client.
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    /// Extension of the client file name, without the dot.
    pub fn original_extension(&self) -> Option<&str> {
        let name = self.original_name.as_deref()?;
        name.rfind('.').map(|i| &name[i + 1..])
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    /// Place the file at `dest`. Movable files are moved (copy + remove
    /// across devices), others are copied.
    pub async fn persist_to(self, dest: impl AsRef<Path>) -> Result<PathBuf> {
        let dest = dest.as_ref().to_path_buf();
        if self.movable {
            if tokio::fs::rename(&self.path, &dest).await.is_err() {
                tokio::fs::copy(&self.path, &dest).await?;
                tokio::fs::remove_file(&self.path).await?;
            }
        } else {
            tokio::fs::copy(&self.path, &dest).await?;
        }
        debug!(from = %self.path.display(), to = %dest.display(), moved = self.movable, "Persisted file");
        Ok(dest)
    }

    /// Delete an unconsumed temp file. No-op for non-movable references.
    pub async fn discard(self) -> Result<()> {
        if self.movable {
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Resolve a static file parameter from the multipart body.
///
/// Oversize parts are rejected before anything is written to disk.
pub(crate) async fn read_file_param(
    ctx: &RequestContext,
    param: &ParameterDescriptor,
    config: &DispatchConfig,
) -> Result<ParamValue> {
    if !ctx.request().is_multipart() {
        return Err(Error::parameter_required(format!(
            "File parameter '{}' needs to be posted as 'multipart/form-data'",
            param.key()
        )));
    }

    let Some(part) = ctx.request().part(param.key()) else {
        return Ok(ParamValue::Null);
    };

    if let Some(max) = param.max_length() {
        if part.size() > max {
            return Err(Error::parameter_too_long(format!(
                "Parameter '{}' has a max length of {} but is {}",
                param.key(),
                max,
                part.size()
            )));
        }
    }

    let dir = config.upload_dir();
    tokio::fs::create_dir_all(&dir).await?;
    let prefix = config.upload_prefix.clone();
    let path = tokio::task::spawn_blocking(move || -> Result<PathBuf> {
        let temp = tempfile::Builder::new().prefix(&prefix).tempfile_in(&dir)?;
        let (_, path) = temp.keep().map_err(|e| Error::Io(e.error))?;
        Ok(path)
    })
    .await
    .map_err(|e| Error::internal(format!("Upload persistence task failed: {}", e)))??;

    if let Err(e) = tokio::fs::write(&path, &part.data).await {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(e.into());
    }

    debug!(
        request_id = %ctx.id(),
        key = %param.key(),
        size = part.size(),
        path = %path.display(),
        "Persisted upload"
    );

    Ok(ParamValue::File(FileRef::temporary(
        path,
        part.content_type.clone(),
        part.file_name.clone(),
    )))
}
