use std::{future::Future, io, path::PathBuf, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::finding::Finding;

/// A named, independently runnable producer of findings.
///
/// Implementations hold whatever collaborators they need (parsers, clients,
/// command runners); the engine only ever calls [`Module::name`] and
/// [`Module::run`].
#[async_trait]
pub trait Module: Send + Sync {
    /// Stable, non-empty identifier, unique within a registry.
    fn name(&self) -> &str;

    /// Execute every check owned by the module.
    async fn run(&self, ctx: &RunContext) -> Result<Vec<Finding>, ModuleError>;
}

/// Failures a module can surface to the engine.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("run cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ModuleError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Cancellable execution context threaded through every module invocation.
///
/// Cloning is cheap and clones share cancellation. The engine never looks at
/// the context; modules are expected to honor it, usually via [`RunContext::guard`].
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails fast when the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<(), ModuleError> {
        if self.is_cancelled() {
            return Err(ModuleError::Cancelled);
        }
        if self.is_expired() {
            return Err(ModuleError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first.
    pub async fn guard<F, T>(&self, fut: F) -> Result<T, ModuleError>
    where
        F: Future<Output = Result<T, ModuleError>>,
    {
        self.check()?;
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => Err(ModuleError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => Err(ModuleError::DeadlineExceeded),
                out = fut => out,
            },
            None => tokio::select! {
                _ = self.token.cancelled() => Err(ModuleError::Cancelled),
                out = fut => out,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_passes_through_result() {
        let ctx = RunContext::new();
        let value = ctx.guard(async { Ok::<_, ModuleError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn guard_reports_cancellation() {
        let ctx = RunContext::new();
        ctx.cancel();
        let err = ctx
            .guard(async { Ok::<_, ModuleError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleError::Cancelled));
    }

    #[tokio::test]
    async fn guard_interrupts_pending_work() {
        let ctx = RunContext::new();
        let canceller = ctx.clone();
        let (result, ()) = futures::join!(
            ctx.guard(futures::future::pending::<Result<(), ModuleError>>()),
            async move { canceller.cancel() },
        );
        assert!(matches!(result, Err(ModuleError::Cancelled)));
    }

    #[tokio::test]
    async fn clones_share_cancellation() {
        let ctx = RunContext::new();
        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(ModuleError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn guard_reports_deadline() {
        let ctx = RunContext::with_timeout(Duration::from_millis(50));
        let err = ctx
            .guard(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ModuleError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleError::DeadlineExceeded));
    }
}
