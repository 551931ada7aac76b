//! Cooperative cancellation for in-flight turns.
//!
//! Every turn gets a fresh token. A newer submit (or an explicit session
//! end) cancels it; the turn pipeline checks the token at every
//! suspension point and awaits it inside `select!` around network calls,
//! so cancelled work aborts promptly and never mutates session state.

use tokio_util::sync::CancellationToken;

/// A cancellation token checked by the turn pipeline.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolve when cancellation is requested. Used as a `select!` arm
    /// around suspension points.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_lifecycle() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn clone_shares_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves() {
        let token = CancelToken::new();
        let clone = token.clone();
        let waiter = tokio::spawn(async move {
            clone.cancelled().await;
            true
        });
        token.cancel();
        assert!(waiter.await.unwrap());
    }
}
