//! Per-request context threaded explicitly through use cases and repositories.
//!
//! A [`RequestContext`] carries the caller's operation id, the authenticated
//! operator (if any), a [`CancellationToken`], and an optional deadline. Store
//! round-trips are wrapped in [`RequestContext::run`] so a cancelled or expired
//! request stops waiting on the database and reports a context error.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

/// Request-scoped values passed by reference to every operation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    operation_id: String,
    operator: Option<String>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context with a fresh cancellation token and no deadline.
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            operator: None,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Context for work not tied to an inbound request (startup, seeding).
    pub fn background() -> Self {
        Self::new("background")
    }

    /// Attach the authenticated operator's user id.
    pub fn with_operator(mut self, user_id: impl Into<String>) -> Self {
        self.operator = Some(user_id.into());
        self
    }

    /// Expire the context `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Replace the cancellation token, e.g. with a child of a parent token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this context and every operation running under it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fail fast if the context is already done.
    pub fn check(&self) -> Result<(), CoreError> {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(CoreError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` until it completes, the context is cancelled, or the
    /// deadline passes. The inner future is dropped on cancellation.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CoreError::Cancelled.into()),
            _ = deadline => Err(CoreError::DeadlineExceeded.into()),
            out = fut => out,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let ctx = RequestContext::new("op-1").with_operator("admin");
        let out: Result<i32, CoreError> = ctx.run(async { Ok(7) }).await;
        assert_eq!(out.unwrap(), 7);
        assert_eq!(ctx.operation_id(), "op-1");
        assert_eq!(ctx.operator(), Some("admin"));
    }

    #[tokio::test]
    async fn cancelled_context_aborts_pending_work() {
        let ctx = RequestContext::new("op-2");
        let token = ctx.cancellation_token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let out: Result<(), CoreError> = ctx
            .run(async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .await;
        assert_matches!(out, Err(CoreError::Cancelled));
    }

    #[tokio::test]
    async fn already_cancelled_context_fails_before_polling() {
        let ctx = RequestContext::new("op-3");
        ctx.cancel();
        let out: Result<(), CoreError> = ctx.run(std::future::ready(Ok(()))).await;
        assert_matches!(out, Err(CoreError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_reports_deadline_exceeded() {
        let ctx = RequestContext::new("op-4").with_timeout(Duration::from_millis(50));
        let out: Result<(), CoreError> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_matches!(out, Err(CoreError::DeadlineExceeded));
    }
}
