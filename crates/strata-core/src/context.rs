//! Cancellable, deadline-bearing execution context.
//!
//! Every database operation runs through [`ExecContext::run`], so a cancelled or
//! expired context surfaces as [`StrataError::Cancelled`] or [`StrataError::Timeout`]
//! rather than as a query failure. The losing future is dropped, which aborts the
//! in-flight statement and rolls back any transaction it owned.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, StrataError};

/// Execution context passed to every operation.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl ExecContext {
    /// A context with no deadline that is only cancelled explicitly.
    pub fn background() -> Self {
        Self::default()
    }

    /// A root context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().child_with_timeout(timeout)
    }

    /// A root context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancellationToken::new(),
        }
    }

    /// Derive a context that is cancelled with this one and expires no later than
    /// `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };

        Self {
            deadline: Some(deadline),
            cancel: self.cancel.child_token(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token that fires when this context is cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fail fast when the context is already done.
    pub fn check(&self, op: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(StrataError::Cancelled(op.to_string()));
        }
        if let Some(deadline) = self.deadline {
            if deadline <= Instant::now() {
                return Err(StrataError::Timeout(op.to_string()));
            }
        }
        Ok(())
    }

    /// Run `fut` under this context's cancellation and deadline.
    pub async fn run<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(op)?;

        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(StrataError::Cancelled(op.to_string())),
                result = fut => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .map_err(|_| StrataError::Timeout(op.to_string()))?,
            None => guarded.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_through_result() {
        let ctx = ExecContext::background();
        let value = ctx.run("answer", async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);

        let err = ctx
            .run::<(), _>("fail", async { Err(StrataError::NotFound("row".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let ctx = ExecContext::with_timeout(Duration::from_secs(1));
        let err = ctx
            .run("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StrataError::Timeout(ref op) if op == "slow"));
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_fast() {
        let ctx = ExecContext::background();
        ctx.cancel();

        let err = ctx.run("noop", async { Ok(()) }).await.unwrap_err();
        assert!(matches!(err, StrataError::Cancelled(_)));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_in_flight_operation() {
        let ctx = ExecContext::background();
        let token = ctx.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let err = ctx
            .run("wait", async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::Cancelled(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_keeps_earlier_deadline() {
        let parent = ExecContext::with_timeout(Duration::from_secs(1));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.child_with_timeout(Duration::from_millis(100));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test]
    async fn test_parent_cancel_reaches_child() {
        let parent = ExecContext::background();
        let child = parent.child_with_timeout(Duration::from_secs(60));
        parent.cancel();
        assert!(child.is_cancelled());
        tokio_test::assert_err!(child.check("child"));
    }
}
