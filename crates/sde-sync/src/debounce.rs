//! Trailing-edge debounce for rapid industry switches

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lets only the last of a burst of calls through
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    latest: AtomicU64,
}

impl Debouncer {
    /// Create debouncer with `window`
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            latest: AtomicU64::new(0),
        }
    }

    /// Debounce window
    #[inline]
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait out the window; `true` if no later call arrived meanwhile
    pub async fn settle(&self) -> bool {
        let mine = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.window.is_zero() {
            tokio::time::sleep(self.window).await;
        }
        self.latest.load(Ordering::SeqCst) == mine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn lone_call_settles() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        assert!(debouncer.settle().await);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_lets_only_last_through() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(300)));

        let first = tokio::spawn({
            let d = debouncer.clone();
            async move { d.settle().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = tokio::spawn({
            let d = debouncer.clone();
            async move { d.settle().await }
        });

        assert!(!first.await.unwrap());
        assert!(second.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_both_settle() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        assert!(debouncer.settle().await);
        assert!(debouncer.settle().await);
    }
}
