//! Core types for the dispatcher.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (RequestId, ScopeId, TokenId)
//! - **Errors**: The dispatch error taxonomy with thiserror derives
//! - **Config**: Configuration structures for dispatch, tokens and logging

mod config;
mod errors;
mod ids;

pub use config::{Config, DispatchConfig, ObservabilityConfig, TokenConfig};
pub use errors::{Error, Result};
pub use ids::{RequestId, ScopeId, TokenId};
