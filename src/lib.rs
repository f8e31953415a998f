//! # Remote Dispatch - Metadata-Driven Request Dispatcher
//!
//! Exposes registered service methods over a request/response transport:
//! - Explicit service/method/parameter metadata built once at registration
//! - Path routing (`/<service>/<method>`) with per-method verb sets
//! - Permission gate in front of parameter resolution
//! - Typed parameter binding from JSON bodies, multipart parts, query/form
//!   tables, file uploads and named dynamic resolvers
//! - Re-entrant transaction wrapper (only the outermost call commits)
//! - Response encoding for documents, streams, soft errors and failures
//!
//! ## Request lifecycle
//!
//! ```text
//!   Request ─→ RoutePath ─→ Registry ─→ verb check ─→ PermissionGate
//!                                                          │
//!   Response ←─ encoder ←─ invoke (TransactionWrapper) ←─ ParameterResolver
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use remote_dispatch::descriptor::{MethodSpec, ParamSpec, ServiceSpec};
//! use remote_dispatch::outcome::Fault;
//! use remote_dispatch::params::Arguments;
//! use remote_dispatch::reply::Reply;
//! use remote_dispatch::{Dispatcher, Registry, Request};
//! use std::sync::Arc;
//!
//! async fn find(args: Arguments) -> Result<Reply, Fault> {
//!     let name = args.text("name")?.unwrap_or_default().to_string();
//!     Ok(Reply::object(vec![name]))
//! }
//!
//! # async fn run() -> remote_dispatch::Result<()> {
//! let mut registry = Registry::new();
//! registry.register_spec(
//!     "users",
//!     ServiceSpec::new().method(MethodSpec::derived(find).param(ParamSpec::text("name").required())),
//! )?;
//!
//! let dispatcher = Dispatcher::builder(Arc::new(registry)).build();
//! let response = dispatcher
//!     .dispatch(Request::get("/users/find").param("name", "ali"))
//!     .await;
//! assert_eq!(response.status(), 200);
//! # Ok(())
//! # }
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod auth;
pub mod descriptor;
pub mod dispatch;
pub mod encoder;
pub mod outcome;
pub mod params;
pub mod registry;
pub mod reply;
pub mod transaction;
pub mod types;
pub mod wire;

// Internal utilities
pub mod observability;

pub use dispatch::Dispatcher;
pub use registry::{Registry, Service};
pub use types::{Config, Error, Result};
pub use wire::{Request, Response};
