use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Version numbering applied when a deleted path is written again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TombstonePolicy {
    /// The tombstone takes `prev + 1` and a re-created path continues from there,
    /// so the per-path history stays gapless across deletes.
    #[default]
    Continue,
    /// The tombstone takes `prev + 1` and the next write starts again at 1.
    Reset,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Maximum number of segments in a path
    #[serde(default = "default_max_path_depth")]
    pub max_path_depth: usize,

    /// Maximum byte length of one segment
    #[serde(default = "default_max_segment_len")]
    pub max_segment_len: usize,

    #[serde(default)]
    pub tombstone_versions: TombstonePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_path_depth: default_max_path_depth(),
            max_segment_len: default_max_segment_len(),
            tombstone_versions: TombstonePolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_path_depth == 0 {
            return Err(Error::InvalidConfig(
                "store.max_path_depth must be greater than 0".into(),
            ));
        }

        if self.max_segment_len == 0 {
            return Err(Error::InvalidConfig(
                "store.max_segment_len must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

const fn default_max_path_depth() -> usize {
    64
}

const fn default_max_segment_len() -> usize {
    255
}
