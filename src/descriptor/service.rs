//! Service metadata: default policy plus the name-indexed method table.

use serde_json::Value;
use std::collections::HashMap;

use super::method::{AccessPolicy, MethodDescriptor, MethodSpec};
use crate::types::{Error, Result};

/// Declaration of a remotely exposed service.
#[derive(Debug, Default)]
pub struct ServiceSpec {
    description: String,
    policy: AccessPolicy,
    methods: Vec<MethodSpec>,
}

impl ServiceSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Every method of the service requires a logged-in caller.
    pub fn user_logged_in(mut self) -> Self {
        self.policy.requires_login = true;
        self
    }

    /// Permission tag required by every method of the service.
    pub fn permission(mut self, tag: impl Into<String>) -> Self {
        self.policy.add_permission(tag);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }
}

/// Immutable metadata of one registered service.
#[derive(Debug)]
pub struct ServiceDescriptor {
    name: String,
    description: String,
    policy: AccessPolicy,
    methods: Vec<MethodDescriptor>,
    index: HashMap<String, usize>,
}

impl ServiceDescriptor {
    pub(crate) fn build(name: impl Into<String>, spec: ServiceSpec) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::registration("Service name cannot be empty"));
        }

        let mut methods = Vec::with_capacity(spec.methods.len());
        for method in spec.methods {
            let method = MethodDescriptor::build(method, &name, &spec.policy)?;
            if methods.iter().any(|m: &MethodDescriptor| m.name() == method.name()) {
                return Err(Error::registration(format!(
                    "Method with name '{}' is already mapped in service '{}'",
                    method.name(),
                    name
                )));
            }
            methods.push(method);
        }
        methods.sort_by(|a, b| a.name().cmp(b.name()));

        let index = methods
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name().to_string(), i))
            .collect();

        Ok(Self {
            name,
            description: spec.description,
            policy: spec.policy,
            methods,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Service-level policy (before merging with any method).
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Upper-camel form of the name, e.g. `user_accounts` -> `UserAccounts`.
    pub fn class_name(&self) -> String {
        self.name
            .split(|c: char| c == '_' || c == '-' || c == '.')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect()
    }

    /// Case-sensitive method lookup.
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.index.get(name).map(|&i| &self.methods[i])
    }

    /// Methods sorted by name.
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub(crate) fn describe(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "className": self.class_name(),
            "description": self.description,
            "userLoggedIn": self.policy.requires_login,
            "permissions": self.policy.permissions,
            "methods": self.methods.iter().map(|m| m.describe()).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Fault;
    use crate::params::Arguments;
    use crate::reply::Reply;

    async fn noop(_args: Arguments) -> std::result::Result<Reply, Fault> {
        Ok(Reply::Null)
    }

    #[test]
    fn test_methods_sorted_and_indexed() {
        let spec = ServiceSpec::new()
            .method(MethodSpec::named("update", noop))
            .method(MethodSpec::named("create", noop))
            .method(MethodSpec::named("find", noop));
        let service = ServiceDescriptor::build("users", spec).unwrap();

        let names: Vec<_> = service.methods().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["create", "find", "update"]);
        assert_eq!(service.method("find").unwrap().name(), "find");
        assert!(service.method("Find").is_none());
    }

    #[test]
    fn test_duplicate_method_is_fatal() {
        let spec = ServiceSpec::new()
            .method(MethodSpec::named("find", noop))
            .method(MethodSpec::named("find", noop));
        let err = ServiceDescriptor::build("users", spec).unwrap_err();
        assert_eq!(
            err.to_string(),
            "registration failed: Method with name 'find' is already mapped in service 'users'"
        );
    }

    #[test]
    fn test_service_policy_flows_into_methods() {
        let spec = ServiceSpec::new()
            .user_logged_in()
            .permission("users.read")
            .method(MethodSpec::named("find", noop));
        let service = ServiceDescriptor::build("users", spec).unwrap();
        let policy = service.method("find").unwrap().policy();
        assert!(policy.requires_login);
        assert!(policy.permissions.contains("users.read"));
    }

    #[test]
    fn test_class_name() {
        let service = ServiceDescriptor::build("user_accounts", ServiceSpec::new()).unwrap();
        assert_eq!(service.class_name(), "UserAccounts");
        let service = ServiceDescriptor::build("users", ServiceSpec::new()).unwrap();
        assert_eq!(service.class_name(), "Users");
    }
}
