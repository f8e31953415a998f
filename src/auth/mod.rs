//! Permission gate and the permission collaborator contract.
//!
//! The gate merges nothing itself: method descriptors already carry the
//! union of service and method policy. It only decides whether the
//! collaborator has to be asked.

mod token;

pub use token::{BearerTokenValidator, InMemoryTokenStore, Token, TokenStore};

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::descriptor::AccessPolicy;
use crate::types::{Error, Result};
use crate::wire::RequestContext;

/// Authentication/authorization failure raised by a permission validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0}")]
    UserNotLoggedIn(String),

    #[error("{0}")]
    PermissionMissing(String),

    #[error("{0}")]
    InvalidCredentials(String),
}

impl AuthError {
    pub fn user_not_logged_in(msg: impl Into<String>) -> Self {
        Self::UserNotLoggedIn(msg.into())
    }

    pub fn permission_missing(msg: impl Into<String>) -> Self {
        Self::PermissionMissing(msg.into())
    }

    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self::InvalidCredentials(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::UserNotLoggedIn(_) => "UserNotLoggedIn",
            AuthError::PermissionMissing(_) => "PermissionMissing",
            AuthError::InvalidCredentials(_) => "InvalidCredentials",
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::UserNotLoggedIn(_) => "USER_NOT_LOGGED_IN",
            AuthError::PermissionMissing(_) => "PERMISSION_MISSING",
            AuthError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::UserNotLoggedIn(_) | AuthError::InvalidCredentials(_) => 401,
            AuthError::PermissionMissing(_) => 403,
        }
    }
}

/// External permission collaborator. Returns normally to let the call pass.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionValidator: Send + Sync {
    async fn validate(
        &self,
        ctx: &RequestContext,
        requires_login: bool,
        permissions: &BTreeSet<String>,
    ) -> std::result::Result<(), AuthError>;
}

impl std::fmt::Debug for dyn PermissionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PermissionValidator")
    }
}

/// Decides whether a call may proceed under a method's merged policy.
#[derive(Clone)]
pub struct PermissionGate {
    enabled: bool,
    validator: Option<Arc<dyn PermissionValidator>>,
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("enabled", &self.enabled)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

impl PermissionGate {
    pub fn new(enabled: bool, validator: Option<Arc<dyn PermissionValidator>>) -> Self {
        Self { enabled, validator }
    }

    /// No-op when disabled or when the policy requires nothing. A policy
    /// that requires something but has no validator to ask fails closed.
    pub async fn check(&self, ctx: &RequestContext, policy: &AccessPolicy) -> Result<()> {
        if !self.enabled || policy.is_open() {
            return Ok(());
        }

        let validator = self.validator.as_ref().ok_or_else(|| {
            Error::internal("Method requires permissions but no permission validator is configured")
        })?;

        debug!(
            request_id = %ctx.id(),
            requires_login = policy.requires_login,
            permissions = ?policy.permissions,
            "Validating permissions"
        );
        validator
            .validate(ctx, policy.requires_login, &policy.permissions)
            .await?;
        Ok(())
    }
}
