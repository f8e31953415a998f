//! Transaction wrapper: exactly one owner commits or rolls back per call chain.
//!
//! Transaction affinity is explicit. Every request carries a
//! [`TransactionScope`]; a nested call made with the same scope finds the
//! transaction already open and joins it instead of opening a second one.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::types::{Error, Result, ScopeId};

/// Identity of one logical call chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TransactionScope(ScopeId);

impl TransactionScope {
    pub fn new() -> Self {
        Self(ScopeId::new())
    }

    pub fn id(&self) -> &ScopeId {
        &self.0
    }
}

/// External resource (typically a database) that owns transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionalResource: Send + Sync {
    async fn is_in_transaction(&self, scope: &TransactionScope) -> Result<bool>;

    async fn start_transaction(&self, scope: &TransactionScope) -> Result<()>;

    async fn commit_transaction(&self, scope: &TransactionScope) -> Result<()>;

    async fn rollback_transaction(&self, scope: &TransactionScope) -> Result<()>;
}

impl std::fmt::Debug for dyn TransactionalResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TransactionalResource")
    }
}

/// Runs an invocation inside a transaction unless one is already open.
#[derive(Clone)]
pub struct TransactionWrapper {
    resource: Arc<dyn TransactionalResource>,
}

impl std::fmt::Debug for TransactionWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionWrapper").finish_non_exhaustive()
    }
}

impl TransactionWrapper {
    pub fn new(resource: Arc<dyn TransactionalResource>) -> Self {
        Self { resource }
    }

    /// Run `invocation` under the scope's transaction.
    ///
    /// Commits only a transaction this call opened; on failure rolls back only
    /// such a transaction and returns the original error unchanged. If
    /// `cancel` fires first the invocation is dropped, an owned transaction
    /// is rolled back and the call fails with `Cancelled`.
    pub async fn run<T, F>(
        &self,
        scope: &TransactionScope,
        cancel: &CancellationToken,
        invocation: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let owner = !self.resource.is_in_transaction(scope).await?;
        if owner {
            self.resource.start_transaction(scope).await?;
            debug!(scope = %scope.id(), "Started transaction");
        } else {
            debug!(scope = %scope.id(), "Joined open transaction");
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::cancelled("request cancelled during invocation")),
            result = invocation => result,
        };

        match outcome {
            Ok(value) => {
                if owner {
                    if let Err(e) = self.resource.commit_transaction(scope).await {
                        error!(scope = %scope.id(), error = %e, "Commit failed, rolling back");
                        self.rollback(scope).await;
                        return Err(match e {
                            Error::Transaction(_) => e,
                            other => Error::transaction(format!("commit failed: {}", other)),
                        });
                    }
                    debug!(scope = %scope.id(), "Committed transaction");
                }
                Ok(value)
            }
            Err(err) => {
                if owner {
                    warn!(scope = %scope.id(), error = %err, "Invocation failed, rolling back");
                    self.rollback(scope).await;
                }
                Err(err)
            }
        }
    }

    async fn rollback(&self, scope: &TransactionScope) {
        match self.resource.rollback_transaction(scope).await {
            Ok(()) => debug!(scope = %scope.id(), "Rolled back transaction"),
            Err(e) => error!(scope = %scope.id(), error = %e, "Rollback failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::always;

    fn owning_resource() -> MockTransactionalResource {
        let mut mock = MockTransactionalResource::new();
        mock.expect_is_in_transaction().returning(|_| Ok(false));
        mock.expect_start_transaction().times(1).returning(|_| Ok(()));
        mock
    }

    #[tokio::test]
    async fn test_owner_commits_on_success() {
        let mut mock = owning_resource();
        mock.expect_commit_transaction().times(1).returning(|_| Ok(()));
        mock.expect_rollback_transaction().never();

        let wrapper = TransactionWrapper::new(Arc::new(mock));
        let value = wrapper
            .run(&TransactionScope::new(), &CancellationToken::new(), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_owner_rolls_back_and_keeps_original_error() {
        let mut mock = owning_resource();
        mock.expect_commit_transaction().never();
        mock.expect_rollback_transaction().times(1).returning(|_| Ok(()));

        let wrapper = TransactionWrapper::new(Arc::new(mock));
        let err = wrapper
            .run::<(), _>(&TransactionScope::new(), &CancellationToken::new(), async {
                Err(Error::invalid_parameter("boom"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn test_nested_call_never_commits_or_rolls_back() {
        let mut mock = MockTransactionalResource::new();
        mock.expect_is_in_transaction().returning(|_| Ok(true));
        mock.expect_start_transaction().never();
        mock.expect_commit_transaction().never();
        mock.expect_rollback_transaction().never();

        let wrapper = TransactionWrapper::new(Arc::new(mock));
        let scope = TransactionScope::new();
        let cancel = CancellationToken::new();
        assert!(wrapper.run(&scope, &cancel, async { Ok(1) }).await.is_ok());
        assert!(wrapper
            .run::<(), _>(&scope, &cancel, async { Err(Error::internal("x")) })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back() {
        let mut mock = owning_resource();
        mock.expect_commit_transaction()
            .with(always())
            .returning(|_| Err(Error::internal("connection lost")));
        mock.expect_rollback_transaction().times(1).returning(|_| Ok(()));

        let wrapper = TransactionWrapper::new(Arc::new(mock));
        let err = wrapper
            .run(&TransactionScope::new(), &CancellationToken::new(), async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transaction(_)));
    }

    #[tokio::test]
    async fn test_cancellation_rolls_back_owned_transaction() {
        let mut mock = owning_resource();
        mock.expect_commit_transaction().never();
        mock.expect_rollback_transaction().times(1).returning(|_| Ok(()));

        let wrapper = TransactionWrapper::new(Arc::new(mock));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = wrapper
            .run(&TransactionScope::new(), &cancel, std::future::pending::<Result<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
    }

    #[tokio::test]
    async fn test_rollback_failure_keeps_original_error() {
        let mut mock = owning_resource();
        mock.expect_rollback_transaction()
            .times(1)
            .returning(|_| Err(Error::transaction("rollback refused")));

        let wrapper = TransactionWrapper::new(Arc::new(mock));
        let err = wrapper
            .run::<(), _>(&TransactionScope::new(), &CancellationToken::new(), async {
                Err(Error::parameter_required("x"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParameterRequired(_)));
    }
}
