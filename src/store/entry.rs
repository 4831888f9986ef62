use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A stored value and the version stamp of the write that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub value: Value,
    /// Starts at 1, grows by exactly 1 per committed mutation of the path
    pub version: u64,
}
