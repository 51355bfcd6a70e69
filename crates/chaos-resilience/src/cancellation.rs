//! Two-level cancellation signal (`spec.md §5`).
//!
//! A `CancellationToken` is a cheap, cloneable handle. Cutting it (`cancel`)
//! wakes every clone waiting on `cancelled()`. Phase-scoped tokens are
//! derived from the scenario-level token with [`CancellationToken::child`]
//! so that cancelling the parent also cancels every child, but cutting a
//! child at phase end never propagates upward.

use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    notify: Notify,
    cancelled: std::sync::atomic::AtomicBool,
}

/// A cancellation signal that can be awaited and checked without blocking.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
    parent: Option<Box<CancellationToken>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            parent: None,
        }
    }

    /// Create a token that is cancelled whenever `self` or the returned
    /// child is cancelled, but cancelling the child does not cancel `self`.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            parent: Some(Box::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, std::sync::atomic::Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(std::sync::atomic::Ordering::SeqCst)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// Resolves once this token (or any ancestor) is cancelled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            match &self.parent {
                Some(parent) => {
                    tokio::select! {
                        _ = notified => {}
                        _ = parent.cancelled() => {}
                    }
                }
                None => notified.await,
            }
            if self.is_cancelled() {
                return;
            }
        }
    }

    /// Runs `fut` to completion, or returns `None` if this token fires
    /// first.
    pub async fn race<F, T>(&self, fut: F) -> Option<T>
    where
        F: std::future::Future<Output = T>,
    {
        tokio::select! {
            result = fut => Some(result),
            _ = self.cancelled() => None,
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_millis(200), handle)
            .await
            .expect("waiter should observe cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn child_is_cancelled_by_parent_but_not_vice_versa() {
        let parent = CancellationToken::new();
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());

        let parent2 = CancellationToken::new();
        let child2 = parent2.child();
        child2.cancel();
        assert!(!parent2.is_cancelled());
    }

    #[tokio::test]
    async fn race_returns_none_when_cancelled_first() {
        let token = CancellationToken::new();
        token.cancel();
        let result = token.race(async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            42
        }).await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn race_returns_value_when_future_wins() {
        let token = CancellationToken::new();
        let result = token.race(async { 7 }).await;
        assert_eq!(result, Some(7));
    }
}
