use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::utils::time::now_millis;
use crate::Entry;
use crate::Path;

/// Kind of committed mutation an [`Update`] describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// Path was created or overwritten
    Put,
    /// Path was deleted; the update is a tombstone
    Delete,
}

/// Immutable record of one committed write or delete.
///
/// Shared between mailboxes as `Arc<Update>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub path: Path,
    pub kind: UpdateKind,
    /// New value; `None` for tombstones
    pub value: Option<Value>,
    pub version: u64,
    /// Commit time in milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl Update {
    pub fn put(
        path: Path,
        entry: &Entry,
    ) -> Self {
        Self {
            path,
            kind: UpdateKind::Put,
            value: Some(entry.value.clone()),
            version: entry.version,
            timestamp: now_millis(),
        }
    }

    pub fn tombstone(
        path: Path,
        version: u64,
    ) -> Self {
        Self {
            path,
            kind: UpdateKind::Delete,
            value: None,
            version,
            timestamp: now_millis(),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.kind == UpdateKind::Delete
    }

    /// The entry a put committed; `None` for tombstones.
    pub fn entry(&self) -> Option<Entry> {
        self.value.as_ref().map(|value| Entry {
            value: value.clone(),
            version: self.version,
        })
    }
}

/// Opaque subscription token; never reused within one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SubscriptionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a subscription.
///
/// `Active → Draining → Closed`, or `Active → Closed` when nothing is queued at
/// unsubscribe time. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// Registered and receiving updates
    Active,
    /// Unsubscribed; queued updates are still readable
    Draining,
    /// Unsubscribed and empty
    Closed,
}
