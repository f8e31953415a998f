//! Method metadata and the invocable handler behind it.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::parameter::{ParamSpec, ParameterDescriptor};
use super::verb::{Verb, VerbSet};
use crate::outcome::Fault;
use crate::params::Arguments;
use crate::reply::Reply;
use crate::types::{Error, Result};

// =============================================================================
// Handler
// =============================================================================

/// Future returned by a method invocation.
pub type HandlerFuture = BoxFuture<'static, std::result::Result<Reply, Fault>>;

/// Invocable target of a method descriptor.
///
/// Implemented for every `Fn(Arguments) -> impl Future<Output = Result<Reply, Fault>>`,
/// so plain `async fn`s and closures capturing the service instance both work.
pub trait MethodHandler: Send + Sync + 'static {
    fn call(&self, args: Arguments) -> HandlerFuture;
}

impl<F, Fut> MethodHandler for F
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<Reply, Fault>> + Send + 'static,
{
    fn call(&self, args: Arguments) -> HandlerFuture {
        Box::pin(self(args))
    }
}

/// Method name derived from a handler's type name: the last path segment of a
/// function item. `None` for closures and generic instantiations.
fn derive_method_name(type_name: &str) -> Option<String> {
    if type_name.contains("{{closure}}") || type_name.contains('<') {
        return None;
    }
    type_name
        .rsplit("::")
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Access policy
// =============================================================================

/// Login requirement and permission tags of a service or method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    pub requires_login: bool,
    pub permissions: BTreeSet<String>,
}

impl AccessPolicy {
    pub fn add_permission(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        let tag = tag.trim();
        if !tag.is_empty() {
            self.permissions.insert(tag.to_string());
        }
    }

    /// Union of permission tags; login is required if either side requires it.
    pub fn merge(&self, other: &AccessPolicy) -> AccessPolicy {
        AccessPolicy {
            requires_login: self.requires_login || other.requires_login,
            permissions: self.permissions.union(&other.permissions).cloned().collect(),
        }
    }

    /// True when neither login nor any permission is required.
    pub fn is_open(&self) -> bool {
        !self.requires_login && self.permissions.is_empty()
    }
}

// =============================================================================
// Registration spec
// =============================================================================

/// Declaration of one method, attached to a service at registration time.
pub struct MethodSpec {
    name: Option<String>,
    handler_type: &'static str,
    description: String,
    verbs: VerbSet,
    policy: AccessPolicy,
    transactioned: bool,
    ttl: u32,
    params: Vec<ParamSpec>,
    handler: Arc<dyn MethodHandler>,
}

impl MethodSpec {
    /// Method with an explicit wire name.
    pub fn named<H: MethodHandler>(name: impl Into<String>, handler: H) -> Self {
        Self::with_name(Some(name.into()), handler)
    }

    /// Method named after the handler function (`users::find` -> `find`).
    pub fn derived<H: MethodHandler>(handler: H) -> Self {
        let name = derive_method_name(std::any::type_name::<H>());
        Self::with_name(name, handler)
    }

    fn with_name<H: MethodHandler>(name: Option<String>, handler: H) -> Self {
        Self {
            name,
            handler_type: std::any::type_name::<H>(),
            description: String::new(),
            verbs: VerbSet::default(),
            policy: AccessPolicy::default(),
            transactioned: false,
            ttl: 0,
            params: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn verbs(mut self, verbs: impl IntoIterator<Item = Verb>) -> Self {
        self.verbs = VerbSet::new(verbs);
        self
    }

    pub fn user_logged_in(mut self) -> Self {
        self.policy.requires_login = true;
        self
    }

    pub fn permission(mut self, tag: impl Into<String>) -> Self {
        self.policy.add_permission(tag);
        self
    }

    pub fn transactioned(mut self) -> Self {
        self.transactioned = true;
        self
    }

    /// Cache lifetime in seconds (0 = no caching).
    pub fn ttl(mut self, seconds: u32) -> Self {
        self.ttl = seconds;
        self
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }
}

impl fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSpec")
            .field("name", &self.name)
            .field("handler_type", &self.handler_type)
            .field("verbs", &self.verbs)
            .field("transactioned", &self.transactioned)
            .field("params", &self.params.len())
            .finish()
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Immutable metadata of one invocable operation.
pub struct MethodDescriptor {
    name: String,
    description: String,
    verbs: VerbSet,
    policy: AccessPolicy,
    transactioned: bool,
    ttl: u32,
    params: Vec<ParameterDescriptor>,
    handler: Arc<dyn MethodHandler>,
}

impl MethodDescriptor {
    /// Build from a spec, merging the owning service's policy into the method's.
    pub(crate) fn build(spec: MethodSpec, service: &str, service_policy: &AccessPolicy) -> Result<Self> {
        let name = spec.name.ok_or_else(|| {
            Error::registration(format!(
                "Cannot derive a method name from '{}' in service '{}'; use MethodSpec::named",
                spec.handler_type, service
            ))
        })?;
        if name.trim().is_empty() {
            return Err(Error::registration(format!(
                "Method name cannot be empty in service '{}'",
                service
            )));
        }
        if spec.verbs.is_empty() {
            return Err(Error::registration(format!(
                "Method '{}' in service '{}' allows no verbs",
                name, service
            )));
        }

        let mut seen = HashSet::new();
        let mut params = Vec::with_capacity(spec.params.len());
        for param in spec.params {
            let param = ParameterDescriptor::build(param, &name)?;
            if !seen.insert(param.key().to_string()) {
                return Err(Error::registration(format!(
                    "Parameter '{}' is declared twice in method '{}'",
                    param.key(),
                    name
                )));
            }
            params.push(param);
        }

        Ok(Self {
            policy: service_policy.merge(&spec.policy),
            name,
            description: spec.description,
            verbs: spec.verbs,
            transactioned: spec.transactioned,
            ttl: spec.ttl,
            params,
            handler: spec.handler,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn verbs(&self) -> &VerbSet {
        &self.verbs
    }

    /// Merged service + method policy.
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn is_transactioned(&self) -> bool {
        self.transactioned
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Declared parameters, in declaration order.
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    pub fn static_parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.params.iter().filter(|p| p.is_static())
    }

    /// True when a client must send multipart to call this method.
    pub fn needs_multipart(&self) -> bool {
        self.static_parameters().any(|p| p.is_file())
    }

    pub fn invoke(&self, args: Arguments) -> HandlerFuture {
        self.handler.call(args)
    }

    pub(crate) fn describe(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "verbs": self.verbs,
            "userLoggedIn": self.policy.requires_login,
            "permissions": self.policy.permissions,
            "transactioned": self.transactioned,
            "ttl": self.ttl,
            "multipart": self.needs_multipart(),
            "parameters": self.params.iter().map(|p| p.describe()).collect::<Vec<_>>(),
        })
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("verbs", &self.verbs)
            .field("policy", &self.policy)
            .field("transactioned", &self.transactioned)
            .field("ttl", &self.ttl)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
