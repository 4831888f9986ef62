use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// return millisecond
///
/// A clock set before the Unix epoch yields 0 rather than failing a write.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_millis() as u64)
        .unwrap_or_default()
}
