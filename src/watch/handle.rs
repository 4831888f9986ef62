use std::sync::Arc;

use futures::Stream;
use tracing::trace;

use super::change_bus::Registry;
use super::mailbox::Mailbox;
use super::mailbox::Popped;
use super::SubscriptionId;
use super::SubscriptionState;
use super::Update;

/// Single reader of one subscription's mailbox.
///
/// Obtained from [`ChangeBus::drain`](super::ChangeBus::drain). Reading starts at
/// the current queue head; dropping the `Drain` releases the read side so a
/// later `drain` call resumes where this one stopped.
#[derive(Debug)]
pub struct Drain {
    mailbox: Arc<Mailbox>,
    registry: Arc<Registry>,
}

impl Drain {
    pub(crate) fn new(
        mailbox: Arc<Mailbox>,
        registry: Arc<Registry>,
    ) -> Self {
        Self { mailbox, registry }
    }

    pub fn id(&self) -> SubscriptionId {
        self.mailbox.id()
    }

    /// Pops the next update without waiting.
    ///
    /// `None` means nothing is queued right now; check [`state`](Self::state)
    /// to tell an idle subscription from a closed one.
    pub fn try_next(&mut self) -> Option<Arc<Update>> {
        match self.pop() {
            Popped::Update(update) => Some(update),
            Popped::Empty | Popped::Closed => None,
        }
    }

    /// Waits for the next update.
    ///
    /// Returns `None` once the subscription is unsubscribed and fully drained.
    /// Wrap in `tokio::time::timeout` to bound the wait.
    pub async fn recv(&mut self) -> Option<Arc<Update>> {
        loop {
            match self.pop() {
                Popped::Update(update) => return Some(update),
                Popped::Closed => return None,
                Popped::Empty => self.mailbox.notified().await,
            }
        }
    }

    /// Turns the drain into a stream that ends when the subscription closes.
    pub fn into_stream(self) -> impl Stream<Item = Arc<Update>> {
        futures::stream::unfold(self, |mut drain| async move {
            drain.recv().await.map(|update| (update, drain))
        })
    }

    pub fn state(&self) -> SubscriptionState {
        self.mailbox.state()
    }

    /// Updates queued and not yet read.
    pub fn pending(&self) -> usize {
        self.mailbox.pending()
    }

    /// Updates this subscription lost to a full bounded mailbox.
    pub fn dropped(&self) -> u64 {
        self.mailbox.dropped()
    }

    fn pop(&mut self) -> Popped {
        let popped = self.mailbox.pop();
        if self.mailbox.state() == SubscriptionState::Closed {
            self.registry.forget(self.mailbox.id());
        }
        popped
    }
}

impl Drop for Drain {
    fn drop(&mut self) {
        self.mailbox.release_reader();
    }
}

/// A subscription bundled with its reader.
///
/// When dropped, the subscription is unregistered and anything still queued is
/// discarded, so a disconnected client leaves nothing behind.
#[derive(Debug)]
pub struct Watcher {
    drain: Drain,
}

impl Watcher {
    pub(crate) fn new(drain: Drain) -> Self {
        Self { drain }
    }

    pub fn id(&self) -> SubscriptionId {
        self.drain.id()
    }

    pub fn try_next(&mut self) -> Option<Arc<Update>> {
        self.drain.try_next()
    }

    pub async fn recv(&mut self) -> Option<Arc<Update>> {
        self.drain.recv().await
    }

    /// Stream of updates; the subscription lives as long as the stream.
    pub fn into_stream(self) -> impl Stream<Item = Arc<Update>> {
        futures::stream::unfold(self, |mut watcher| async move {
            watcher.recv().await.map(|update| (update, watcher))
        })
    }

    pub fn state(&self) -> SubscriptionState {
        self.drain.state()
    }

    pub fn pending(&self) -> usize {
        self.drain.pending()
    }

    pub fn dropped(&self) -> u64 {
        self.drain.dropped()
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        let id = self.drain.id();
        // Already closed through `unsubscribe` and drained: nothing to do.
        let _ = self.drain.registry.close(id, true);
        trace!(subscription_id = %id, "Watcher unregistered via guard");
    }
}
