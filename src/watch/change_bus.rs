use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::mailbox::Delivery;
use super::mailbox::Mailbox;
use super::Drain;
use super::SubscriptionId;
use super::SubscriptionState;
use super::Update;
use super::Watcher;
use crate::config::WatchConfig;
use crate::metrics::ACTIVE_SUBSCRIPTIONS;
use crate::metrics::PUBLISH_FANOUT;
use crate::metrics::UPDATES_DELIVERED;
use crate::metrics::UPDATES_DROPPED;
use crate::metrics::UPDATES_PUBLISHED;
use crate::Path;
use crate::Pattern;
use crate::Result;
use crate::WatchError;

/// A wildcard pattern owned by one subscription
#[derive(Debug, Clone)]
struct WildcardRoute {
    id: SubscriptionId,
    pattern: Pattern,
}

/// Shared registry state behind every [`ChangeBus`] clone
#[derive(Debug)]
pub(crate) struct Registry {
    /// Active and draining mailboxes; closed ones are forgotten
    subscriptions: DashMap<SubscriptionId, Arc<Mailbox>>,

    /// Wildcard-free patterns, keyed by the one path they select
    exact: DashMap<Path, Vec<SubscriptionId>>,

    /// Patterns containing `*` or `**`; publish reads a snapshot without locking
    wildcard: ArcSwap<Vec<WildcardRoute>>,

    /// Next subscription id (monotonically increasing)
    next_id: AtomicU64,

    config: WatchConfig,
}

impl Registry {
    /// Removes `id`'s routes so no further publish selects it.
    fn unroute(
        &self,
        mailbox: &Mailbox,
    ) {
        let id = mailbox.id();
        for pattern in mailbox.patterns() {
            if let Some(path) = pattern.literal_path() {
                // Atomic check-and-remove so a concurrent subscribe to the same
                // path is never lost between the retain and the removal.
                self.exact.remove_if_mut(&path, |_path, ids| {
                    ids.retain(|other| *other != id);
                    ids.is_empty()
                });
            }
        }

        if mailbox.patterns().iter().any(|p| !p.is_literal()) {
            self.wildcard.rcu(|routes| {
                routes.iter().filter(|route| route.id != id).cloned().collect::<Vec<_>>()
            });
        }
    }

    /// Stops deliveries to `id`. `discard` drops anything still queued and
    /// also finishes a draining subscription.
    pub(crate) fn close(
        &self,
        id: SubscriptionId,
        discard: bool,
    ) -> Result<SubscriptionState> {
        let mailbox = self
            .subscriptions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(WatchError::SubscriptionNotFound(id))?;

        let (previous, next) =
            mailbox.close(discard).ok_or(WatchError::SubscriptionNotFound(id))?;
        if previous == SubscriptionState::Active {
            self.unroute(&mailbox);
            ACTIVE_SUBSCRIPTIONS.dec();
        }

        if next == SubscriptionState::Closed {
            self.forget(id);
        }

        debug!(
            subscription_id = %id,
            state = ?next,
            pending = mailbox.pending(),
            "Subscription unregistered"
        );
        Ok(next)
    }

    /// Drops a closed mailbox from the registry.
    pub(crate) fn forget(
        &self,
        id: SubscriptionId,
    ) {
        if self
            .subscriptions
            .remove_if(&id, |_id, mailbox| mailbox.state() == SubscriptionState::Closed)
            .is_some()
        {
            trace!(subscription_id = %id, "Subscription closed");
        }
    }
}

/// Fans committed updates out to pattern subscriptions.
///
/// Cloning is cheap; all clones share one registry.
///
/// # Delivery guarantees
///
/// - A subscription registered before `publish` starts receives the update iff
///   one of its patterns matches the update's path.
/// - A subscription receives each update at most once, however many of its
///   patterns match.
/// - `publish` never waits on a reader. With bounded mailboxes
///   ([`WatchConfig::queue_capacity`]) overflow is resolved by
///   [`OverflowPolicy`](crate::OverflowPolicy) and counted.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    inner: Arc<Registry>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(WatchConfig::default())
    }
}

impl ChangeBus {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            inner: Arc::new(Registry {
                subscriptions: DashMap::new(),
                exact: DashMap::new(),
                wildcard: ArcSwap::from_pointee(Vec::new()),
                next_id: AtomicU64::new(1),
                config,
            }),
        }
    }

    /// Registers interest in every path matching any of `patterns`.
    ///
    /// All patterns are parsed before anything is registered; one malformed
    /// pattern rejects the whole call.
    pub fn subscribe<I>(
        &self,
        patterns: I,
    ) -> Result<SubscriptionId>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let parsed = patterns
            .into_iter()
            .map(|raw| Pattern::parse(raw.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.subscribe_with(parsed)
    }

    /// Same as [`subscribe`](Self::subscribe) for already parsed patterns.
    pub fn subscribe_with(
        &self,
        mut patterns: Vec<Pattern>,
    ) -> Result<SubscriptionId> {
        if patterns.is_empty() {
            return Err(WatchError::EmptyPatternSet.into());
        }
        patterns.sort_by_cached_key(|p| p.to_string());
        patterns.dedup();

        let id = SubscriptionId::from(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let mailbox = Arc::new(Mailbox::new(id, patterns, &self.inner.config));

        // The mailbox must exist before any route can select it.
        self.inner.subscriptions.insert(id, mailbox.clone());

        let mut wildcards = Vec::new();
        for pattern in mailbox.patterns() {
            match pattern.literal_path() {
                Some(path) => self.inner.exact.entry(path).or_default().push(id),
                None => wildcards.push(WildcardRoute {
                    id,
                    pattern: pattern.clone(),
                }),
            }
        }
        if !wildcards.is_empty() {
            self.inner.wildcard.rcu(|routes| {
                let mut next = Vec::with_capacity(routes.len() + wildcards.len());
                next.extend(routes.iter().cloned());
                next.extend(wildcards.iter().cloned());
                next
            });
        }
        ACTIVE_SUBSCRIPTIONS.inc();

        trace!(
            subscription_id = %id,
            patterns = ?mailbox.patterns(),
            "Subscription registered"
        );
        Ok(id)
    }

    /// Stops new deliveries to `id`.
    ///
    /// Updates already queued stay readable through [`drain`](Self::drain); the
    /// subscription is `Draining` until they are consumed, then `Closed`.
    /// Fails with `SubscriptionNotFound` unless the subscription is `Active`.
    pub fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) -> Result<()> {
        self.inner.close(id, false).map(|_| ())
    }

    /// Appends `update` to the mailbox of every matching subscription.
    ///
    /// Returns the number of mailboxes that accepted it.
    pub fn publish(
        &self,
        update: Update,
    ) -> usize {
        let update = Arc::new(update);
        UPDATES_PUBLISHED.inc();

        let mut targets: Vec<SubscriptionId> = self
            .inner
            .exact
            .get(&update.path)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();

        let routes = self.inner.wildcard.load();
        targets.extend(
            routes.iter().filter(|route| route.pattern.matches(&update.path)).map(|route| route.id),
        );
        targets.sort_unstable();
        targets.dedup();

        let mut delivered = 0;
        for id in &targets {
            let Some(mailbox) = self.inner.subscriptions.get(id).map(|entry| entry.value().clone())
            else {
                continue;
            };

            match mailbox.push(update.clone()) {
                Delivery::Delivered => delivered += 1,
                Delivery::DeliveredEvicting => {
                    delivered += 1;
                    self.record_drop(*id, &update);
                }
                Delivery::Rejected => self.record_drop(*id, &update),
                Delivery::Inactive => {}
            }
        }

        PUBLISH_FANOUT.observe(targets.len() as f64);
        UPDATES_DELIVERED.inc_by(delivered as u64);
        trace!(
            path = %update.path,
            kind = ?update.kind,
            version = update.version,
            watchers = delivered,
            "Update dispatched"
        );
        delivered
    }

    fn record_drop(
        &self,
        id: SubscriptionId,
        update: &Update,
    ) {
        UPDATES_DROPPED.inc();
        if self.inner.config.log_dropped {
            warn!(
                subscription_id = %id,
                path = %update.path,
                version = update.version,
                policy = ?self.inner.config.overflow_policy,
                "Mailbox full, update dropped"
            );
        }
    }

    /// Opens the single reader of `id`'s mailbox.
    ///
    /// Reading resumes at the current queue head; nothing consumed earlier is
    /// replayed. Works on `Active` and `Draining` subscriptions.
    pub fn drain(
        &self,
        id: SubscriptionId,
    ) -> Result<Drain> {
        let mailbox = self
            .inner
            .subscriptions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(WatchError::SubscriptionNotFound(id))?;

        if mailbox.state() == SubscriptionState::Closed {
            self.inner.forget(id);
            return Err(WatchError::SubscriptionNotFound(id).into());
        }
        if !mailbox.claim_reader() {
            return Err(WatchError::DrainInProgress(id).into());
        }

        Ok(Drain::new(mailbox, self.inner.clone()))
    }

    /// Subscribes and opens the reader in one step.
    ///
    /// Dropping the returned [`Watcher`] unsubscribes and discards anything
    /// still queued.
    pub fn watch<I>(
        &self,
        patterns: I,
    ) -> Result<Watcher>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let id = self.subscribe(patterns)?;
        let drain = self.drain(id)?;
        Ok(Watcher::new(drain))
    }

    /// Lifecycle state of `id`.
    ///
    /// Ids this bus issued but has since forgotten report `Closed`.
    pub fn state(
        &self,
        id: SubscriptionId,
    ) -> Result<SubscriptionState> {
        if let Some(mailbox) = self.inner.subscriptions.get(&id) {
            return Ok(mailbox.state());
        }
        if id.as_u64() > 0 && id.as_u64() < self.inner.next_id.load(Ordering::Relaxed) {
            return Ok(SubscriptionState::Closed);
        }
        Err(WatchError::SubscriptionNotFound(id).into())
    }

    /// Number of queued, unread updates for `id`.
    pub fn pending(
        &self,
        id: SubscriptionId,
    ) -> Result<usize> {
        self.inner
            .subscriptions
            .get(&id)
            .map(|mailbox| mailbox.pending())
            .ok_or_else(|| WatchError::SubscriptionNotFound(id).into())
    }

    /// Number of subscriptions that are `Active` or `Draining`.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.len()
    }

    /// Number of distinct paths with at least one exact-path subscriber.
    pub fn watched_path_count(&self) -> usize {
        self.inner.exact.len()
    }

    pub fn config(&self) -> &WatchConfig {
        &self.inner.config
    }
}
