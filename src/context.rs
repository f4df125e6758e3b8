//! Cancellation and deadline context handed to factories

use crate::errors::{ContextError, ContextResult};

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation token plus an optional deadline.
///
/// The pool forwards the context untouched to [`Factory::create`](crate::Factory::create);
/// its own storage operations never wait, so they ignore it. Clones share
/// the same token.
///
/// # Examples
///
/// ```
/// use recycle_pool::{Context, ContextError};
/// use std::time::Duration;
///
/// let ctx = Context::with_timeout(Duration::from_secs(5));
/// assert!(ctx.err().is_none());
///
/// let observer = ctx.clone();
/// ctx.cancel();
/// assert_eq!(observer.err(), Some(ContextError::Cancelled));
/// ```
#[derive(Clone, Debug)]
pub struct Context {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::build(CancellationToken::new(), None)
    }

    /// A context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(CancellationToken::new(), Some(deadline))
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(CancellationToken::new(), Instant::now().checked_add(timeout))
    }

    fn build(cancellation: CancellationToken, deadline: Option<Instant>) -> Self {
        Self {
            cancellation,
            deadline,
        }
    }

    /// Derive a context that is cancelled along with this one, but can
    /// also be cancelled on its own. The deadline is inherited.
    pub fn child(&self) -> Self {
        Self::build(self.cancellation.child_token(), self.deadline)
    }

    /// Mark the context cancelled and wake everything waiting in [`done`](Self::done)
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether [`cancel`](Self::cancel) was called on this context or a parent
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// The instant after which the context reports [`ContextError::DeadlineExceeded`]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    ///
    /// Cancellation takes precedence over an elapsed deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.is_cancelled() {
            return Some(ContextError::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Ok(())` while the context is live, the reason otherwise
    pub fn check(&self) -> ContextResult<()> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resolve once the context is cancelled or its deadline passes.
    ///
    /// Factories race this against their own work to honour cancellation.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancellation.cancelled() => ContextError::Cancelled,
                    () = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                        ContextError::DeadlineExceeded
                    }
                }
            }
            None => {
                self.cancellation.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let ctx = Context::background();
        let clone = ctx.clone();

        clone.cancel();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
    }

    #[test]
    fn test_child_follows_parent_only() {
        let parent = Context::with_timeout(Duration::from_secs(30));
        let child = parent.child();
        assert_eq!(child.deadline(), parent.deadline());

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let other = parent.child();
        parent.cancel();
        assert_eq!(other.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn test_elapsed_deadline() {
        let ctx = Context::with_deadline(Instant::now());
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));

        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }

    #[tokio::test]
    async fn test_done_on_cancel() {
        let ctx = Context::background();
        let waiter = ctx.clone();

        let handle = tokio::spawn(async move { waiter.done().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.cancel();

        assert_eq!(handle.await.unwrap(), ContextError::Cancelled);
    }

    #[tokio::test]
    async fn test_done_on_deadline() {
        let ctx = Context::with_timeout(Duration::from_millis(20));

        let err = tokio::time::timeout(Duration::from_secs(2), ctx.done())
            .await
            .unwrap();
        assert_eq!(err, ContextError::DeadlineExceeded);
    }
}
