use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use tracing::trace;

use super::slot::Slot;
use super::Entry;
use crate::config::StoreConfig;
use crate::config::TombstonePolicy;
use crate::metrics::STORE_OPERATIONS;
use crate::ChangeBus;
use crate::Path;
use crate::Result;
use crate::StoreError;
use crate::Update;

/// Path-addressed map of versioned JSON values.
///
/// Writes to one path are serialized by that path's slot lock; writes to
/// different paths only meet briefly on the map shard while the slot is looked
/// up. Every committed mutation is published to the [`ChangeBus`] after the
/// slot lock is released and before the call returns.
#[derive(Debug)]
pub struct VersionedStore {
    pub(super) slots: DashMap<Path, Arc<Slot>>,
    /// Number of paths holding a live (non-tombstoned) value
    live: AtomicUsize,
    bus: ChangeBus,
    config: StoreConfig,
}

impl VersionedStore {
    pub fn new(
        config: StoreConfig,
        bus: ChangeBus,
    ) -> Self {
        Self {
            slots: DashMap::new(),
            live: AtomicUsize::new(0),
            bus,
            config,
        }
    }

    /// Store with default limits publishing to `bus`.
    pub fn with_bus(bus: ChangeBus) -> Self {
        Self::new(StoreConfig::default(), bus)
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Parses `raw` and applies the configured depth and segment limits.
    pub fn parse_path(
        &self,
        raw: &str,
    ) -> Result<Path> {
        let path = Path::parse(raw)?;
        path.check_limits(self.config.max_path_depth, self.config.max_segment_len)?;
        Ok(path)
    }

    /// Current entry at `path`.
    pub fn read(
        &self,
        path: &str,
    ) -> Result<Entry> {
        let path = self.parse_path(path)?;
        STORE_OPERATIONS.with_label_values(&["read"]).inc();

        let slot = self.slot(&path).ok_or_else(|| not_found(&path))?;
        let state = slot.state.read();
        match &state.value {
            Some(value) => Ok(Entry {
                value: value.clone(),
                version: state.version,
            }),
            None => Err(not_found(&path)),
        }
    }

    /// Reads `path` and resolves an RFC 6901 JSON pointer inside its value.
    ///
    /// The returned entry carries the pointed-to value and the version of the
    /// whole entry. An empty pointer selects the whole value.
    pub fn read_pointer(
        &self,
        path: &str,
        pointer: &str,
    ) -> Result<Entry> {
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(StoreError::InvalidPointer(pointer.to_string()).into());
        }

        let entry = self.read(path)?;
        match entry.value.pointer(pointer) {
            Some(target) => Ok(Entry {
                value: target.clone(),
                version: entry.version,
            }),
            None => Err(StoreError::NotFound(format!("{path}#{pointer}")).into()),
        }
    }

    /// Upserts `value` at `path` and returns the committed entry.
    pub fn write(
        &self,
        path: &str,
        value: Value,
    ) -> Result<Entry> {
        let path = self.parse_path(path)?;
        self.put(path, value, None)
    }

    /// Writes only if the live version equals `expected`.
    ///
    /// `None` requires the path to hold no live value. On mismatch nothing is
    /// written or published.
    pub fn compare_and_write(
        &self,
        path: &str,
        expected: Option<u64>,
        value: Value,
    ) -> Result<Entry> {
        let path = self.parse_path(path)?;
        self.put(path, value, Some(expected))
    }

    /// Removes the value at `path`, returning the entry that was removed.
    ///
    /// Subscribers receive a tombstone whose version is one past the removed
    /// entry's. See [`TombstonePolicy`] for how a later write is numbered.
    pub fn delete(
        &self,
        path: &str,
    ) -> Result<Entry> {
        let path = self.parse_path(path)?;
        let slot = self.slot(&path).ok_or_else(|| not_found(&path))?;

        let (removed, tombstone_version, sequence) = {
            let mut state = slot.state.write();
            let value = state.value.take().ok_or_else(|| not_found(&path))?;
            let removed = Entry {
                value,
                version: state.version,
            };
            state.version += 1;
            state.sequence += 1;
            (removed, state.version, state.sequence)
        };
        self.live.fetch_sub(1, Ordering::Relaxed);
        STORE_OPERATIONS.with_label_values(&["delete"]).inc();

        let update = Update::tombstone(path.clone(), tombstone_version);
        let delivered = slot.publish_in_order(sequence, || self.bus.publish(update));

        debug!(
            path = %path,
            version = tombstone_version,
            watchers = delivered,
            "Committed delete"
        );
        Ok(removed)
    }

    /// Version stamp of the last mutation at `path`, tombstones included.
    pub fn version_of(
        &self,
        path: &str,
    ) -> Result<Option<u64>> {
        let path = self.parse_path(path)?;
        let Some(slot) = self.slot(&path) else {
            return Ok(None);
        };
        let version = slot.state.read().version;
        Ok((version > 0).then_some(version))
    }

    /// Number of paths holding a live value.
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put(
        &self,
        path: Path,
        value: Value,
        expected: Option<Option<u64>>,
    ) -> Result<Entry> {
        let slot = self.slot_or_insert(&path);

        let (entry, sequence, created) = {
            let mut state = slot.state.write();
            let actual = state.live_version();
            if let Some(expected) = expected {
                if actual != expected {
                    trace!(path = %path, ?expected, ?actual, "Conditional write rejected");
                    return Err(StoreError::VersionConflict {
                        path: path.to_string(),
                        expected,
                        actual,
                    }
                    .into());
                }
            }

            let version = match (actual, self.config.tombstone_versions) {
                (None, TombstonePolicy::Reset) => 1,
                _ => state.version + 1,
            };
            state.value = Some(value.clone());
            state.version = version;
            state.sequence += 1;
            (Entry { value, version }, state.sequence, actual.is_none())
        };
        if created {
            self.live.fetch_add(1, Ordering::Relaxed);
        }
        STORE_OPERATIONS.with_label_values(&["write"]).inc();

        let update = Update::put(path.clone(), &entry);
        let delivered = slot.publish_in_order(sequence, || self.bus.publish(update));

        debug!(
            path = %path,
            version = entry.version,
            watchers = delivered,
            "Committed write"
        );
        Ok(entry)
    }

    fn slot(
        &self,
        path: &Path,
    ) -> Option<Arc<Slot>> {
        self.slots.get(path).map(|slot| slot.value().clone())
    }

    fn slot_or_insert(
        &self,
        path: &Path,
    ) -> Arc<Slot> {
        if let Some(slot) = self.slot(path) {
            return slot;
        }
        self.slots.entry(path.clone()).or_default().value().clone()
    }
}

fn not_found(path: &Path) -> crate::Error {
    StoreError::NotFound(path.to_string()).into()
}
