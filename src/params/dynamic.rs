//! Dynamic parameters: values produced by named resolvers instead of being
//! read from the request.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::value::ParamValue;
use crate::types::Result;
use crate::wire::{RequestContext, Response};

/// Resolver registered under a name; parameters keyed `$<name>` use it.
///
/// Shared across in-flight requests.
#[async_trait]
pub trait DynamicParameter: Send + Sync {
    /// Produce the value for `key` (sentinel stripped).
    async fn resolve(
        &self,
        ctx: &RequestContext,
        response: &mut Response,
        key: &str,
    ) -> Result<ParamValue>;
}

/// Name-indexed resolver table.
#[derive(Clone, Default)]
pub struct DynamicResolvers {
    resolvers: HashMap<String, Arc<dyn DynamicParameter>>,
}

impl DynamicResolvers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the resolver for `name`.
    pub fn insert(&mut self, name: impl Into<String>, resolver: Arc<dyn DynamicParameter>) {
        self.resolvers.insert(name.into(), resolver);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn DynamicParameter>> {
        self.resolvers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }
}

impl fmt::Debug for DynamicResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.resolvers.keys().collect();
        names.sort();
        f.debug_struct("DynamicResolvers")
            .field("names", &names)
            .finish()
    }
}
