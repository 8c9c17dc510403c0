//! Bounded replay work queue with completion tracking.
//!
//! Items travel over a bounded crossbeam channel. Alongside the channel
//! the queue counts unfinished items: `put` increments the count, and
//! every item a worker takes must be settled exactly once with
//! [`task_done`](ReplayQueue::task_done) (processed, successfully or not)
//! or [`abandon`](ReplayQueue::abandon) (dropped during shutdown).
//! [`join`](ReplayQueue::join) blocks until the count reaches zero.
//!
//! [`close`](ReplayQueue::close) wakes every blocked producer and
//! consumer. Items still buffered are discarded and settled as
//! abandoned.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use sc2feat_core::ReplayWorkItem;

// ── QueueError ─────────────────────────────────────────────────────

/// Errors from queue operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// The queue has been closed.
    Closed,
    /// `task_done` or `abandon` was called more times than items were
    /// put.
    Unbalanced,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "work queue closed"),
            Self::Unbalanced => write!(f, "more items settled than were put"),
        }
    }
}

impl std::error::Error for QueueError {}

// ── ReplayQueue ────────────────────────────────────────────────────

struct Inner {
    tx: Sender<ReplayWorkItem>,
    rx: Receiver<ReplayWorkItem>,
    close_tx: Mutex<Option<Sender<()>>>,
    close_rx: Receiver<()>,
    closed: AtomicBool,
    unfinished: Mutex<usize>,
    settled: Condvar,
    processed: AtomicU64,
    abandoned: AtomicU64,
}

/// Multi-producer, multi-consumer replay queue. Clones share state.
#[derive(Clone)]
pub struct ReplayQueue {
    inner: Arc<Inner>,
}

impl ReplayQueue {
    /// Queue holding at most `capacity` buffered items (minimum 1).
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        let (close_tx, close_rx) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                tx,
                rx,
                close_tx: Mutex::new(Some(close_tx)),
                close_rx,
                closed: AtomicBool::new(false),
                unfinished: Mutex::new(0),
                settled: Condvar::new(),
                processed: AtomicU64::new(0),
                abandoned: AtomicU64::new(0),
            }),
        }
    }

    fn unfinished(&self) -> MutexGuard<'_, usize> {
        self.inner
            .unfinished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue an item, blocking while the queue is full.
    pub fn put(&self, item: ReplayWorkItem) -> Result<(), QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }
        *self.unfinished() += 1;
        let sent = select! {
            send(self.inner.tx, item) -> res => res.is_ok(),
            recv(self.inner.close_rx) -> _ => false,
        };
        if !sent {
            self.settle(false)?;
            return Err(QueueError::Closed);
        }
        if self.is_closed() {
            // Raced with close after its drain; take the item back out.
            if self.inner.rx.try_recv().is_ok() {
                self.settle(false)?;
            }
            return Err(QueueError::Closed);
        }
        Ok(())
    }

    /// Take the next item, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed.
    pub fn get(&self) -> Option<ReplayWorkItem> {
        if self.is_closed() {
            return None;
        }
        select! {
            recv(self.inner.rx) -> item => item.ok(),
            recv(self.inner.close_rx) -> _ => None,
        }
    }

    /// Mark a taken item as processed.
    pub fn task_done(&self) -> Result<(), QueueError> {
        self.settle(true)
    }

    /// Mark a taken item as dropped without processing.
    pub fn abandon(&self) -> Result<(), QueueError> {
        self.settle(false)
    }

    fn settle(&self, processed: bool) -> Result<(), QueueError> {
        let mut unfinished = self.unfinished();
        if *unfinished == 0 {
            return Err(QueueError::Unbalanced);
        }
        *unfinished -= 1;
        if processed {
            self.inner.processed.fetch_add(1, Ordering::AcqRel);
        } else {
            self.inner.abandoned.fetch_add(1, Ordering::AcqRel);
        }
        if *unfinished == 0 {
            self.inner.settled.notify_all();
        }
        Ok(())
    }

    /// Block until every item put has been settled, or the queue is
    /// closed.
    pub fn join(&self) -> Result<(), QueueError> {
        let mut unfinished = self.unfinished();
        while *unfinished > 0 {
            if self.is_closed() {
                return Err(QueueError::Closed);
            }
            unfinished = self
                .inner
                .settled
                .wait(unfinished)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Ok(())
    }

    /// Close the queue: wake blocked callers and abandon buffered items.
    ///
    /// Returns the number of buffered items discarded. Idempotent.
    pub fn close(&self) -> usize {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return 0;
        }
        self.inner
            .close_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let mut discarded = 0;
        while self.inner.rx.try_recv().is_ok() {
            if self.settle(false).is_ok() {
                discarded += 1;
            }
        }
        // Wake joiners even when items are still in flight.
        let _guard = self.unfinished();
        self.inner.settled.notify_all();
        discarded
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Items settled with `task_done`.
    pub fn processed(&self) -> u64 {
        self.inner.processed.load(Ordering::Acquire)
    }

    /// Items settled with `abandon` or discarded by `close`.
    pub fn abandoned(&self) -> u64 {
        self.inner.abandoned.load(Ordering::Acquire)
    }

    /// Items put but not yet settled.
    pub fn pending(&self) -> usize {
        *self.unfinished()
    }

    /// Items currently buffered.
    pub fn len(&self) -> usize {
        self.inner.rx.len()
    }

    /// Whether no items are buffered.
    pub fn is_empty(&self) -> bool {
        self.inner.rx.is_empty()
    }
}

impl fmt::Debug for ReplayQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayQueue")
            .field("buffered", &self.len())
            .field("pending", &self.pending())
            .field("processed", &self.processed())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc2feat_core::PlayerId;
    use std::thread;
    use std::time::Duration;

    fn item(name: &str) -> ReplayWorkItem {
        ReplayWorkItem::new(format!("/replays/{name}.SC2Replay"), PlayerId(1))
    }

    #[test]
    fn fifo_order_and_counts() {
        let q = ReplayQueue::bounded(4);
        q.put(item("a")).unwrap();
        q.put(item("b")).unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q.get().unwrap().replay_id, "a");
        assert_eq!(q.get().unwrap().replay_id, "b");
        assert_eq!(q.pending(), 2);
        q.task_done().unwrap();
        q.abandon().unwrap();
        assert_eq!(q.pending(), 0);
        assert_eq!(q.processed(), 1);
        assert_eq!(q.abandoned(), 1);
    }

    #[test]
    fn settling_more_than_put_is_unbalanced() {
        let q = ReplayQueue::bounded(1);
        assert_eq!(q.task_done(), Err(QueueError::Unbalanced));
    }

    #[test]
    fn join_waits_for_every_task_done() {
        let q = ReplayQueue::bounded(8);
        for i in 0..5 {
            q.put(item(&i.to_string())).unwrap();
        }
        let consumer = q.clone();
        let handle = thread::spawn(move || {
            while consumer.processed() < 5 {
                if consumer.get().is_some() {
                    thread::sleep(Duration::from_millis(2));
                    consumer.task_done().unwrap();
                }
            }
        });
        q.join().unwrap();
        assert_eq!(q.processed(), 5);
        handle.join().unwrap();
    }

    #[test]
    fn put_blocks_when_full_until_close() {
        let q = ReplayQueue::bounded(1);
        q.put(item("a")).unwrap();
        let producer = q.clone();
        let handle = thread::spawn(move || producer.put(item("b")));
        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());
        assert_eq!(q.close(), 1);
        assert_eq!(handle.join().unwrap(), Err(QueueError::Closed));
        assert_eq!(q.pending(), 0);
    }

    #[test]
    fn close_wakes_consumers_and_joiners() {
        let q = ReplayQueue::bounded(2);
        q.put(item("a")).unwrap();
        let taken = q.get().unwrap();
        assert_eq!(taken.replay_id, "a");

        let consumer = q.clone();
        let getter = thread::spawn(move || consumer.get());
        let joiner_q = q.clone();
        let joiner = thread::spawn(move || joiner_q.join());
        thread::sleep(Duration::from_millis(20));
        q.close();
        assert_eq!(getter.join().unwrap(), None);
        assert_eq!(joiner.join().unwrap(), Err(QueueError::Closed));
        assert_eq!(q.put(item("b")), Err(QueueError::Closed));
        // The in-flight item can still be settled.
        q.abandon().unwrap();
        assert_eq!(q.pending(), 0);
    }
}
