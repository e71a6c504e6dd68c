//! Work Queue - drives a batch of items through an async worker
//!
//! Both orchestrators hand their item list to a [`WorkQueue`]. With a limit of
//! one (the default) each item's work finishes before the next item starts, so
//! backend load stays at one request and progress reads top to bottom. Raising
//! the limit runs up to that many workers at once; outputs still come back in
//! item order.

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkQueue {
    limit: NonZeroUsize,
}

impl WorkQueue {
    /// One item at a time.
    pub const fn sequential() -> Self {
        Self {
            limit: NonZeroUsize::MIN,
        }
    }

    /// Up to `limit` items in flight. Zero is treated as one.
    pub fn bounded(limit: usize) -> Self {
        Self {
            limit: NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub const fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Run `worker` over every item, returning outputs in item order.
    ///
    /// Every item is attempted; a worker that reports failure through its
    /// output does not stop the rest of the batch.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, worker: F) -> Vec<R>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = R>,
    {
        stream::iter(items)
            .map(worker)
            .buffered(self.limit.get())
            .collect()
            .await
    }

    /// Like [`Self::run`], but hands each output to `sink` as soon as it and
    /// every earlier item are done, still in item order.
    pub async fn run_each<T, R, F, Fut, S, SFut>(&self, items: Vec<T>, worker: F, sink: S)
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = R>,
        S: FnMut(R) -> SFut,
        SFut: Future<Output = ()>,
    {
        stream::iter(items)
            .map(worker)
            .buffered(self.limit.get())
            .for_each(sink)
            .await;
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::sequential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn outputs_follow_item_order() {
        let queue = WorkQueue::bounded(3);
        let out = queue
            .run(vec![30u64, 10, 20], |ms| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                ms
            })
            .await;
        assert_eq!(out, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn sink_sees_item_order_despite_completion_order() {
        let seen = std::sync::Mutex::new(Vec::new());
        WorkQueue::bounded(3)
            .run_each(
                vec![30u64, 10, 20],
                |ms| async move {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    ms
                },
                |ms| {
                    seen.lock().unwrap().push(ms);
                    async {}
                },
            )
            .await;
        assert_eq!(seen.into_inner().unwrap(), vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn sequential_never_overlaps() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        WorkQueue::sequential()
            .run((0..5).collect(), |_: i32| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_limit_is_sequential() {
        assert_eq!(WorkQueue::bounded(0).limit(), 1);
    }
}
