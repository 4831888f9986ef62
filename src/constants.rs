// -
// Path grammar

/// Segment separator shared by paths and patterns
pub(crate) const PATH_SEPARATOR: char = '/';

/// Matches exactly one segment
pub(crate) const SINGLE_SEGMENT_WILDCARD: &str = "*";

/// Matches zero or more segments
pub(crate) const MULTI_SEGMENT_WILDCARD: &str = "**";

// -
// Configuration sources

/// Prefix for environment overrides, e.g. `PATHKV__WATCH__QUEUE_CAPACITY`
pub(crate) const CONFIG_ENV_PREFIX: &str = "PATHKV";
pub(crate) const CONFIG_ENV_SEPARATOR: &str = "__";

/// Names a TOML file merged over the defaults
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
