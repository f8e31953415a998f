//! Metadata model: service, method and parameter descriptors.
//!
//! Descriptors are built once from explicit registration specs
//! ([`ServiceSpec`], [`MethodSpec`], [`ParamSpec`]) and are read-only
//! afterwards, so concurrent requests share them without locking.

mod method;
mod parameter;
mod service;
mod verb;

pub use method::{AccessPolicy, HandlerFuture, MethodDescriptor, MethodHandler, MethodSpec};
pub use parameter::{ParamSpec, ParamType, ParameterDescriptor, Validation, DYNAMIC_SENTINEL};
pub use service::{ServiceDescriptor, ServiceSpec};
pub use verb::{Verb, VerbSet};
