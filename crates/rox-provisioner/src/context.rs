use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ProvisionerError;

/// Cancellation and deadline for one reconciliation pass.
///
/// Every suspension point of a pass goes through [`PassContext::run`], so a
/// cancelled or expired pass stops at the next remote call instead of
/// hanging on it.
#[derive(Debug, Clone)]
pub struct PassContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for PassContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PassContext {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// A context cancelled together with `parent`, e.g. a process-wide
    /// shutdown token.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            cancel: parent.child_token(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `fut` unless the pass is cancelled or its deadline passes first.
    pub async fn run<F>(&self, operation: &'static str, fut: F) -> Result<F::Output, ProvisionerError>
    where
        F: Future,
    {
        if self.cancel.is_cancelled() {
            return Err(ProvisionerError::Cancelled { operation });
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProvisionerError::Cancelled { operation }),
            _ = sleep_until(self.deadline) => Err(ProvisionerError::DeadlineExceeded { operation }),
            out = fut => Ok(out),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
