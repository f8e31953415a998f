//! Typed argument values handed to method handlers.

use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::upload::FileRef;
use crate::transaction::TransactionScope;
use crate::types::{Error, Result};

/// A resolved parameter value.
#[derive(Clone)]
pub enum ParamValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uuid(Uuid),
    List(Vec<String>),
    Document(Value),
    File(FileRef),
    /// Opaque value produced by a dynamic resolver (e.g. a session object).
    Extension(Arc<dyn Any + Send + Sync>),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    pub fn extension<T: Any + Send + Sync>(value: T) -> Self {
        ParamValue::Extension(Arc::new(value))
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("Null"),
            ParamValue::Text(v) => f.debug_tuple("Text").field(v).finish(),
            ParamValue::Int(v) => f.debug_tuple("Int").field(v).finish(),
            ParamValue::Float(v) => f.debug_tuple("Float").field(v).finish(),
            ParamValue::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            ParamValue::Uuid(v) => f.debug_tuple("Uuid").field(v).finish(),
            ParamValue::List(v) => f.debug_tuple("List").field(v).finish(),
            ParamValue::Document(v) => f.debug_tuple("Document").field(v).finish(),
            ParamValue::File(v) => f.debug_tuple("File").field(v).finish(),
            ParamValue::Extension(_) => f.write_str("Extension(..)"),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        ParamValue::Document(value)
    }
}

/// Bound argument list of one invocation, in declaration order.
///
/// Values are addressed by their declared key (`$`-prefixed for dynamic
/// parameters) or by position.
#[derive(Debug, Default)]
pub struct Arguments {
    entries: Vec<(String, ParamValue)>,
    scope: TransactionScope,
}

impl Arguments {
    pub fn new(scope: TransactionScope) -> Self {
        Self {
            entries: Vec::new(),
            scope,
        }
    }

    pub(crate) fn push(&mut self, key: impl Into<String>, value: ParamValue) {
        self.entries.push((key.into(), value));
    }

    /// Transaction scope of the call; pass it on to nested calls.
    pub fn scope(&self) -> &TransactionScope {
        &self.scope
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn at(&self, index: usize) -> Option<&ParamValue> {
        self.entries.get(index).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn lookup(&self, key: &str) -> Result<Option<&ParamValue>> {
        match self.get(key) {
            None => Err(Error::internal(format!("No argument bound for '{}'", key))),
            Some(ParamValue::Null) => Ok(None),
            Some(value) => Ok(Some(value)),
        }
    }

    fn mismatch(key: &str, expected: &str) -> Error {
        Error::internal(format!("Argument '{}' is not {}", key, expected))
    }

    pub fn text(&self, key: &str) -> Result<Option<&str>> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ParamValue::Text(v)) => Ok(Some(v)),
            Some(_) => Err(Self::mismatch(key, "text")),
        }
    }

    pub fn int(&self, key: &str) -> Result<Option<i64>> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ParamValue::Int(v)) => Ok(Some(*v)),
            Some(_) => Err(Self::mismatch(key, "an integer")),
        }
    }

    pub fn float(&self, key: &str) -> Result<Option<f64>> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ParamValue::Float(v)) => Ok(Some(*v)),
            Some(ParamValue::Int(v)) => Ok(Some(*v as f64)),
            Some(_) => Err(Self::mismatch(key, "a number")),
        }
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ParamValue::Bool(v)) => Ok(Some(*v)),
            Some(_) => Err(Self::mismatch(key, "a boolean")),
        }
    }

    pub fn uuid(&self, key: &str) -> Result<Option<Uuid>> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ParamValue::Uuid(v)) => Ok(Some(*v)),
            Some(_) => Err(Self::mismatch(key, "a UUID")),
        }
    }

    pub fn list(&self, key: &str) -> Result<Option<&[String]>> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ParamValue::List(v)) => Ok(Some(v)),
            Some(_) => Err(Self::mismatch(key, "a list")),
        }
    }

    pub fn document(&self, key: &str) -> Result<Option<&Value>> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ParamValue::Document(v)) => Ok(Some(v)),
            Some(_) => Err(Self::mismatch(key, "a document")),
        }
    }

    /// Take ownership of an uploaded file, leaving `Null` behind.
    pub fn take_file(&mut self, key: &str) -> Result<Option<FileRef>> {
        let slot = self
            .entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| Error::internal(format!("No argument bound for '{}'", key)))?;
        match std::mem::replace(slot, ParamValue::Null) {
            ParamValue::File(file) => Ok(Some(file)),
            ParamValue::Null => Ok(None),
            other => {
                *slot = other;
                Err(Self::mismatch(key, "a file"))
            }
        }
    }

    /// Resolver-produced value of type `T`.
    pub fn extension<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ParamValue::Extension(v)) => Arc::clone(v)
                .downcast::<T>()
                .map(Some)
                .map_err(|_| Self::mismatch(key, std::any::type_name::<T>())),
            Some(_) => Err(Self::mismatch(key, "an extension value")),
        }
    }
}
