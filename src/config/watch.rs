use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Result;

/// What a bounded mailbox does when an update arrives and it is full.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued update to make room
    #[default]
    DropOldest,
    /// Discard the incoming update
    DropNewest,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Capacity of each subscription's mailbox
    ///
    /// `0` means unbounded: every matching update is queued and the writer is
    /// never throttled, at the cost of memory for slow readers. A bounded
    /// mailbox applies [`OverflowPolicy`] when full.
    ///
    /// **Default**: 0
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Applied only when `queue_capacity > 0`
    #[serde(default)]
    pub overflow_policy: OverflowPolicy,

    /// Log a warning for every dropped update
    ///
    /// **Default**: true
    #[serde(default = "default_log_dropped")]
    pub log_dropped: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            overflow_policy: OverflowPolicy::default(),
            log_dropped: default_log_dropped(),
        }
    }
}

impl WatchConfig {
    pub fn is_bounded(&self) -> bool {
        self.queue_capacity > 0
    }

    /// Validates watch configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity > 100_000 {
            warn!(
                "watch.queue_capacity ({}) is very large; each slow subscriber may hold that many updates",
                self.queue_capacity
            );
        }

        Ok(())
    }
}

const fn default_queue_capacity() -> usize {
    0
}

const fn default_log_dropped() -> bool {
    true
}
