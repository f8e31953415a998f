//! Service registry: builds descriptor trees once and serves name lookups.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::descriptor::{MethodDescriptor, ServiceDescriptor, ServiceSpec};
use crate::types::{Error, Result};

/// A backend service that may be exposed remotely.
///
/// Only services whose [`Service::remote`] returns a spec are accepted by the
/// registry; the default implementation opts out.
pub trait Service: Send + Sync + 'static {
    /// Unique service name, used as the first path segment.
    fn name(&self) -> &str;

    /// Remote-exposure declaration. Handlers typically capture `self`.
    fn remote(self: Arc<Self>) -> Option<ServiceSpec> {
        None
    }
}

/// Registry of remotely exposed services.
#[derive(Debug, Default)]
pub struct Registry {
    services: HashMap<String, ServiceDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service instance. Fails if the instance is not remotely
    /// exposed, its name is taken, or its method table is invalid.
    pub fn register(&mut self, instance: Arc<dyn Service>) -> Result<()> {
        let name = instance.name().to_string();
        let spec = instance.remote().ok_or_else(|| {
            Error::registration(format!("Service '{}' is not exposed for remote calls", name))
        })?;
        self.register_spec(name, spec)
    }

    /// Register a service from an explicit spec.
    pub fn register_spec(&mut self, name: impl Into<String>, spec: ServiceSpec) -> Result<()> {
        let name = name.into();
        if self.services.contains_key(&name) {
            return Err(Error::registration(format!(
                "Service with name '{}' is already registered",
                name
            )));
        }

        let descriptor = ServiceDescriptor::build(name.clone(), spec)?;
        info!(
            service = %name,
            methods = descriptor.methods().len(),
            "Registered remote service"
        );
        for method in descriptor.methods() {
            debug!(
                service = %name,
                method = %method.name(),
                verbs = %method.verbs(),
                "Mapped method"
            );
        }
        self.services.insert(name, descriptor);
        Ok(())
    }

    pub fn service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.get(name)
    }

    pub fn method(&self, service: &str, method: &str) -> Option<&MethodDescriptor> {
        self.service(service).and_then(|s| s.method(method))
    }

    /// All services, sorted by name.
    pub fn descriptors(&self) -> Vec<&ServiceDescriptor> {
        let mut services: Vec<_> = self.services.values().collect();
        services.sort_by(|a, b| a.name().cmp(b.name()));
        services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// JSON listing of every service and method, for introspection.
    pub fn describe(&self) -> Value {
        Value::Array(self.descriptors().iter().map(|s| s.describe()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{MethodSpec, ParamSpec};
    use crate::outcome::Fault;
    use crate::params::Arguments;
    use crate::reply::Reply;

    async fn noop(_args: Arguments) -> std::result::Result<Reply, Fault> {
        Ok(Reply::Null)
    }

    struct Users;

    impl Service for Users {
        fn name(&self) -> &str {
            "users"
        }

        fn remote(self: Arc<Self>) -> Option<ServiceSpec> {
            Some(
                ServiceSpec::new()
                    .method(MethodSpec::named("find", noop).param(ParamSpec::text("name")))
                    .method(MethodSpec::named("create", noop)),
            )
        }
    }

    struct Mailer;

    impl Service for Mailer {
        fn name(&self) -> &str {
            "mailer"
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register(Arc::new(Users)).unwrap();

        assert!(registry.service("users").is_some());
        assert!(registry.method("users", "find").is_some());
        assert!(registry.method("users", "delete").is_none());
        assert!(registry.method("Users", "find").is_none());
    }

    #[test]
    fn test_rejects_non_remote_service() {
        let mut registry = Registry::new();
        let err = registry.register(Arc::new(Mailer)).unwrap_err();
        assert!(matches!(err, Error::Registration(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rejects_duplicate_service() {
        let mut registry = Registry::new();
        registry.register(Arc::new(Users)).unwrap();
        assert!(registry.register(Arc::new(Users)).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_descriptors_sorted() {
        let mut registry = Registry::new();
        registry.register_spec("zeta", ServiceSpec::new()).unwrap();
        registry.register_spec("alpha", ServiceSpec::new()).unwrap();
        registry.register(Arc::new(Users)).unwrap();

        let names: Vec<_> = registry.descriptors().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["alpha", "users", "zeta"]);
    }

    #[test]
    fn test_describe_lists_methods_and_params() {
        let mut registry = Registry::new();
        registry.register(Arc::new(Users)).unwrap();

        let listing = registry.describe();
        let users = &listing[0];
        assert_eq!(users["name"], "users");
        assert_eq!(users["className"], "Users");
        assert_eq!(users["methods"][0]["name"], "create");
        assert_eq!(users["methods"][1]["parameters"][0]["key"], "name");
        assert_eq!(users["methods"][1]["verbs"], serde_json::json!(["GET", "POST"]));
    }
}
