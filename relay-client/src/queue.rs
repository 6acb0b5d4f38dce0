//! Concurrency-bounded FIFO task queue.
//!
//! Admits at most `limit` operations at once; the rest wait in enqueue
//! order. The admission state is an explicit object owned by whoever
//! composes the queue, so independent queues with distinct limits can
//! coexist (and be tested in isolation).

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

/// FIFO queue admitting at most a fixed number of concurrent operations.
///
/// Admission and completion both mutate shared state, so it sits behind a
/// mutex; waiters park on oneshot channels and are woken strictly in
/// enqueue order.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Mutex<QueueState>>,
}

struct QueueState {
    limit: usize,
    active: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl TaskQueue {
    /// Create a queue admitting at most `limit` concurrent operations.
    pub fn new(limit: usize) -> Self {
        assert!(limit > 0, "concurrency limit must be at least 1");
        Self {
            inner: Arc::new(Mutex::new(QueueState {
                limit,
                active: 0,
                waiters: VecDeque::new(),
            })),
        }
    }

    /// Number of currently admitted operations.
    pub fn active_count(&self) -> usize {
        self.inner.lock().expect("queue lock poisoned").active
    }

    /// Number of operations waiting for admission.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().expect("queue lock poisoned").waiters.len()
    }

    /// Enqueue `operation`; the returned future settles exactly as the
    /// operation settles, once admitted.
    ///
    /// On any admitted operation's settlement (success or failure) the
    /// oldest waiter is admitted next. One operation's failure never blocks
    /// or cancels its siblings.
    pub async fn add<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire().await;
        let _slot = SlotGuard { queue: self };
        operation().await
    }

    async fn acquire(&self) {
        let waiter = {
            let mut state = self.inner.lock().expect("queue lock poisoned");
            if state.active < state.limit {
                state.active += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            }
        };

        if let Some(rx) = waiter {
            // The releasing side hands its slot over before signalling, so
            // a wake-up means the slot is already ours.
            let _ = rx.await;
        }
    }

    fn release(&self) {
        let mut state = self.inner.lock().expect("queue lock poisoned");
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(()).is_ok() {
                // Slot handed directly to the oldest waiter.
                return;
            }
            // That waiter gave up while pending; try the next oldest.
        }
        state.active -= 1;
    }
}

/// Releases the slot when the admitted operation settles, even if its
/// future is dropped mid-flight.
struct SlotGuard<'a> {
    queue: &'a TaskQueue,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.queue.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks how many operations overlap, and the highest overlap seen.
    struct Overlap {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Overlap {
        fn new() -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_never_admits_more_than_limit() {
        let queue = TaskQueue::new(3);
        let overlap = Arc::new(Overlap::new());

        let mut handles = Vec::new();
        for _ in 0..10 {
            let queue = queue.clone();
            let overlap = overlap.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .add(|| async move {
                        overlap.enter();
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        overlap.exit();
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(overlap.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(queue.active_count(), 0);
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_limit_one_runs_in_enqueue_order() {
        let queue = TaskQueue::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for task in 1..=3usize {
            let queue = queue.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .add(|| async move {
                        order.lock().unwrap().push(task);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    })
                    .await;
            }));
            // Let the spawned task reach the queue before enqueueing the
            // next one, so enqueue order is deterministic.
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_result_passes_through_unchanged() {
        let queue = TaskQueue::new(2);

        let ok: Result<u32, String> = queue.add(|| async { Ok(5) }).await;
        assert_eq!(ok.unwrap(), 5);

        let err: Result<u32, String> = queue.add(|| async { Err("boom".to_string()) }).await;
        assert_eq!(err.unwrap_err(), "boom");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_failure_admits_next_waiter() {
        let queue = TaskQueue::new(1);
        let ran = Arc::new(AtomicUsize::new(0));

        let first = {
            let queue = queue.clone();
            tokio::spawn(async move {
                let _: Result<(), String> = queue
                    .add(|| async {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Err("first fails".to_string())
                    })
                    .await;
            })
        };
        tokio::task::yield_now().await;

        let second = {
            let queue = queue.clone();
            let ran = ran.clone();
            tokio::spawn(async move {
                queue
                    .add(|| async move {
                        ran.fetch_add(1, Ordering::SeqCst);
                    })
                    .await;
            })
        };

        first.await.unwrap();
        second.await.unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(queue.active_count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_counts_reflect_admission_state() {
        let queue = TaskQueue::new(1);

        let slow = {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue
                    .add(|| async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    })
                    .await;
            })
        };
        tokio::task::yield_now().await;

        let waiting = {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue.add(|| async {}).await;
            })
        };
        tokio::task::yield_now().await;

        assert_eq!(queue.active_count(), 1);
        assert_eq!(queue.pending_count(), 1);

        slow.await.unwrap();
        waiting.await.unwrap();
        assert_eq!(queue.active_count(), 0);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    #[should_panic(expected = "concurrency limit must be at least 1")]
    fn test_zero_limit_is_rejected() {
        let _ = TaskQueue::new(0);
    }
}
