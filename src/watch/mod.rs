//! Change notification for committed store mutations.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────────┐
//! │ VersionedStore   │ commit under per-path lock, release lock
//! └────────┬─────────┘
//!          │ publish(Update)   [in per-path version order]
//!          ▼
//! ┌──────────────────┐
//! │ ChangeBus        │ exact-path index (DashMap)
//! │                  │ + wildcard routes (ArcSwap snapshot)
//! └────────┬─────────┘
//!          │ push(Arc<Update>)  [never waits on readers]
//!          ▼
//! ┌──────────────────┐
//! │ Mailbox          │ one per subscription
//! └────────┬─────────┘
//!          │ Drain / Watcher   [single reader]
//!          ▼
//!   request gateway stream
//! ```
//!
//! # Usage Example
//!
//! ```
//! use pathkv::{ChangeBus, UpdateKind, VersionedStore};
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bus = ChangeBus::default();
//! let store = VersionedStore::with_bus(bus.clone());
//!
//! let mut watcher = bus.watch(["users/*"]).unwrap();
//! store.write("/users/42", json!({"name": "a"})).unwrap();
//!
//! let update = watcher.recv().await.unwrap();
//! assert_eq!(update.kind, UpdateKind::Put);
//! assert_eq!(update.version, 1);
//! # });
//! ```
//!
//! # Queue Policy
//!
//! Mailboxes are unbounded by default: every matching update is kept until
//! read. With [`WatchConfig::queue_capacity`](crate::WatchConfig) set, a full
//! mailbox drops either the oldest queued update or the incoming one, per
//! [`OverflowPolicy`](crate::OverflowPolicy). Readers can detect loss through
//! [`Drain::dropped`] and re-sync with a read.
//!
//! # Subscription Lifecycle
//!
//! `unsubscribe` moves a subscription to `Draining`; updates already queued
//! stay readable and the subscription becomes `Closed` once they are consumed.
//! Dropping a [`Watcher`] closes immediately and discards its queue.

mod change_bus;
mod handle;
mod mailbox;
mod update;


pub use change_bus::ChangeBus;
pub use handle::Drain;
pub use handle::Watcher;
pub use update::SubscriptionId;
pub use update::SubscriptionState;
pub use update::Update;
pub use update::UpdateKind;
