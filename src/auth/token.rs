//! Bearer-token permission validator.
//!
//! Reads `Authorization: Bearer <token>`, resolves the token through a
//! [`TokenStore`] and requires it to permit every tag of the call's policy.
//! The same validator serves the `$token` dynamic parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use super::{AuthError, PermissionValidator};
use crate::params::{DynamicParameter, ParamValue};
use crate::types::{Error, Result, TokenConfig, TokenId};
use crate::wire::{RequestContext, Response};

const BEARER_PREFIX: &str = "Bearer ";

/// Issued access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub until: DateTime<Utc>,
    pub permissions: BTreeSet<String>,
}

impl Token {
    pub fn permits(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn permits_all(&self, permissions: &BTreeSet<String>) -> bool {
        permissions.is_subset(&self.permissions)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.until <= now
    }
}

/// Token persistence.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Live token for `id`; expired and unknown tokens are `None`.
    async fn resolve(&self, id: &str) -> Option<Token>;

    /// Invalidate a token. Returns whether it existed.
    async fn invalidate(&self, id: &str) -> bool;
}

/// Process-local token store.
#[derive(Debug)]
pub struct InMemoryTokenStore {
    ttl: Duration,
    tokens: RwLock<HashMap<String, Token>>,
}

impl InMemoryTokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Store issuing tokens with the configured lifetime.
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.token_ttl)
    }

    /// Issue a token valid for the store's ttl.
    pub async fn issue<I, S>(&self, permissions: I) -> Result<Token>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| Error::internal(format!("token ttl out of range: {}", e)))?;
        let token = Token {
            id: TokenId::new(),
            until: Utc::now() + ttl,
            permissions: permissions.into_iter().map(Into::into).collect(),
        };
        self.insert(token.clone()).await;
        Ok(token)
    }

    pub async fn insert(&self, token: Token) {
        self.tokens
            .write()
            .await
            .insert(token.id.as_str().to_string(), token);
    }

    /// Drop every expired token. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired(now));
        before - tokens.len()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn resolve(&self, id: &str) -> Option<Token> {
        let token = self.tokens.read().await.get(id).cloned()?;
        if token.is_expired(Utc::now()) {
            self.tokens.write().await.remove(id);
            return None;
        }
        Some(token)
    }

    async fn invalidate(&self, id: &str) -> bool {
        self.tokens.write().await.remove(id).is_some()
    }
}

/// Permission validator backed by bearer tokens.
#[derive(Clone)]
pub struct BearerTokenValidator {
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for BearerTokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenValidator").finish_non_exhaustive()
    }
}

impl BearerTokenValidator {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Token of the caller, if the request carries a live one.
    pub async fn token(&self, ctx: &RequestContext) -> Option<Token> {
        let id = ctx.header("authorization")?.strip_prefix(BEARER_PREFIX)?.trim();
        if id.is_empty() {
            return None;
        }
        self.store.resolve(id).await
    }

    pub async fn invalidate(&self, id: &str) -> bool {
        self.store.invalidate(id).await
    }
}

#[async_trait]
impl PermissionValidator for BearerTokenValidator {
    async fn validate(
        &self,
        ctx: &RequestContext,
        requires_login: bool,
        permissions: &BTreeSet<String>,
    ) -> std::result::Result<(), AuthError> {
        if !requires_login && permissions.is_empty() {
            return Ok(());
        }

        let token = self
            .token(ctx)
            .await
            .ok_or_else(|| AuthError::invalid_credentials("Invalid token"))?;
        if !token.permits_all(permissions) {
            debug!(request_id = %ctx.id(), token = %token.id, "Token lacks required permissions");
            return Err(AuthError::invalid_credentials("Invalid token"));
        }
        Ok(())
    }
}

#[async_trait]
impl DynamicParameter for BearerTokenValidator {
    async fn resolve(&self, ctx: &RequestContext, _response: &mut Response, _key: &str) -> Result<ParamValue> {
        Ok(match self.token(ctx).await {
            Some(token) => ParamValue::extension(token),
            None => ParamValue::Null,
        })
    }
}
