//! Per-subscription delivery queue.
//!
//! Any number of publishers append; exactly one [`Drain`](super::Drain) pops.
//! The lock is held only for the queue operation itself, and the reader is
//! woken through a [`Notify`] permit so a push racing with an idle reader is
//! never lost.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::SubscriptionId;
use super::SubscriptionState;
use super::Update;
use crate::config::OverflowPolicy;
use crate::config::WatchConfig;
use crate::Pattern;

/// Outcome of appending to a mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// Queued, but the oldest pending update was evicted for it
    DeliveredEvicting,
    /// Discarded because the queue is full
    Rejected,
    /// The subscription no longer accepts updates
    Inactive,
}

/// Outcome of popping from a mailbox
#[derive(Debug)]
pub(crate) enum Popped {
    Update(Arc<Update>),
    Empty,
    Closed,
}

#[derive(Debug)]
struct MailboxInner {
    queue: VecDeque<Arc<Update>>,
    state: SubscriptionState,
}

#[derive(Debug)]
pub(crate) struct Mailbox {
    id: SubscriptionId,
    patterns: Vec<Pattern>,
    inner: Mutex<MailboxInner>,
    notify: Notify,
    /// Set while a `Drain` holds the read side
    reader_claimed: AtomicBool,
    dropped: AtomicU64,
    /// 0 means unbounded
    capacity: usize,
    overflow: OverflowPolicy,
}

impl Mailbox {
    pub(crate) fn new(
        id: SubscriptionId,
        patterns: Vec<Pattern>,
        config: &WatchConfig,
    ) -> Self {
        Self {
            id,
            patterns,
            inner: Mutex::new(MailboxInner {
                queue: VecDeque::new(),
                state: SubscriptionState::Active,
            }),
            notify: Notify::new(),
            reader_claimed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            capacity: config.queue_capacity,
            overflow: config.overflow_policy,
        }
    }

    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub(crate) fn push(
        &self,
        update: Arc<Update>,
    ) -> Delivery {
        let outcome = {
            let mut inner = self.inner.lock();
            if inner.state != SubscriptionState::Active {
                return Delivery::Inactive;
            }

            if self.capacity > 0 && inner.queue.len() >= self.capacity {
                match self.overflow {
                    OverflowPolicy::DropNewest => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        return Delivery::Rejected;
                    }
                    OverflowPolicy::DropOldest => {
                        inner.queue.pop_front();
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        inner.queue.push_back(update);
                        Delivery::DeliveredEvicting
                    }
                }
            } else {
                inner.queue.push_back(update);
                Delivery::Delivered
            }
        };

        self.notify.notify_one();
        outcome
    }

    pub(crate) fn pop(&self) -> Popped {
        let mut inner = self.inner.lock();
        match inner.queue.pop_front() {
            Some(update) => {
                if inner.state == SubscriptionState::Draining && inner.queue.is_empty() {
                    inner.state = SubscriptionState::Closed;
                }
                Popped::Update(update)
            }
            None => match inner.state {
                SubscriptionState::Active => Popped::Empty,
                SubscriptionState::Draining | SubscriptionState::Closed => {
                    inner.state = SubscriptionState::Closed;
                    Popped::Closed
                }
            },
        }
    }

    /// Stops accepting updates. Returns `(previous, next)` state, or `None`
    /// when there was nothing to close.
    ///
    /// With `discard` the pending queue is dropped and the mailbox closes
    /// immediately; this also finishes a `Draining` mailbox.
    pub(crate) fn close(
        &self,
        discard: bool,
    ) -> Option<(SubscriptionState, SubscriptionState)> {
        let transition = {
            let mut inner = self.inner.lock();
            let previous = inner.state;
            match previous {
                SubscriptionState::Active => {}
                SubscriptionState::Draining if discard => {}
                _ => return None,
            }
            if discard {
                inner.queue.clear();
            }
            inner.state = if inner.queue.is_empty() {
                SubscriptionState::Closed
            } else {
                SubscriptionState::Draining
            };
            (previous, inner.state)
        };

        // wake a parked reader so it observes the transition
        self.notify.notify_one();
        Some(transition)
    }

    pub(crate) fn state(&self) -> SubscriptionState {
        self.inner.lock().state
    }

    pub(crate) fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn claim_reader(&self) -> bool {
        self.reader_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release_reader(&self) {
        self.reader_claimed.store(false, Ordering::Release);
    }

    pub(crate) async fn notified(&self) {
        self.notify.notified().await
    }
}
