//! Cancellation Token Module
//!
//! A caller-supplied signal that aborts cache operations, either explicitly
//! or once an absolute deadline has passed.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{CacheError, Result};

// == Cancel Token ==
/// Cancellation handle with an optional deadline.
///
/// Clones share cancellation state: cancelling any clone cancels all of them.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Creates a token that only fires when cancelled explicitly.
    pub fn new() -> Self {
        Self {
            inner: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Creates a token that fires `timeout` from now.
    ///
    /// A timeout too large for the clock never fires on its own.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Creates a token that fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derives a token that is cancelled together with this one, but can
    /// also be cancelled on its own. The deadline is inherited.
    pub fn child(&self) -> Self {
        Self {
            inner: self.inner.child_token(),
            deadline: self.deadline,
        }
    }

    /// Like [`child`](Self::child), tightening the deadline to at most
    /// `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(existing), Some(candidate)) => Some(existing.min(candidate)),
            (existing, candidate) => existing.or(candidate),
        };
        Self {
            inner: self.inner.child_token(),
            deadline,
        }
    }

    /// Cancels this token and every child derived from it.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// True once cancelled or once the deadline is reached.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with [`CacheError::Cancelled`] if the token has already fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(CacheError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when the token is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.inner.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.inner.cancelled().await,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_new_token_never_fires_on_its_own() {
        let token = CancelToken::new();
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let token = CancelToken::with_timeout(Duration::from_secs(2));
        assert!(!token.is_cancelled());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(CacheError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_is_already_cancelled() {
        let token = CancelToken::with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_resolves_at_deadline() {
        let token = CancelToken::with_timeout(Duration::from_millis(500));
        let start = Instant::now();
        token.cancelled().await;
        assert!(Instant::now() - start >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_cancel_propagates_to_clones_and_children() {
        let parent = CancelToken::new();
        let clone = parent.clone();
        let child = parent.child();

        parent.cancel();

        assert!(clone.is_cancelled());
        assert!(child.is_cancelled());
        child.cancelled().await;
    }

    #[tokio::test]
    async fn test_child_cancel_does_not_reach_parent() {
        let parent = CancelToken::new();
        let child = parent.child();

        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_with_timeout_keeps_tighter_deadline() {
        let parent = CancelToken::with_timeout(Duration::from_secs(1));
        let child = parent.child_with_timeout(Duration::from_secs(10));

        let loose = CancelToken::new();
        let tightened = loose.child_with_timeout(Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(child.is_cancelled());
        assert!(tightened.is_cancelled());
        assert!(!loose.is_cancelled());
    }

    #[tokio::test]
    async fn test_unbounded_timeout_never_fires() {
        let token = CancelToken::with_timeout(Duration::MAX);
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_child_timeout_keeps_parent_deadline() {
        let parent = CancelToken::with_timeout(Duration::from_secs(2));
        let child = parent.child_with_timeout(Duration::MAX);
        assert!(!child.is_cancelled());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(child.is_cancelled());

        let unbounded = CancelToken::new().child_with_timeout(Duration::MAX);
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(!unbounded.is_cancelled());
    }
}
