//! Cancellable one-shot timers.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A delayed unit of work owned by whoever scheduled it.
///
/// Dropping or cancelling the task aborts it if it has not run yet, so
/// replacing a stored `ScheduledTask` cancels the previous one. Must be created
/// inside a tokio runtime.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Run `work` after `delay`.
    pub fn after<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        });
        Self { handle }
    }

    /// Run `work` now, still owned and abortable.
    pub fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(work),
        }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// True once the work has completed or was aborted.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let task = ScheduledTask::after(Duration::from_millis(100), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let task = ScheduledTask::after(Duration::from_millis(100), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(task);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_cancels_previous() {
        let hits = Arc::new(AtomicUsize::new(0));
        let first = hits.clone();
        let mut slot = ScheduledTask::after(Duration::from_millis(100), async move {
            first.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = hits.clone();
        let previous = std::mem::replace(
            &mut slot,
            ScheduledTask::after(Duration::from_millis(100), async move {
                second.fetch_add(10, Ordering::SeqCst);
            }),
        );
        drop(previous);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 10);
        drop(slot);
    }
}
