//! Canonical hierarchical paths.
//!
//! A [`Path`] is a non-empty sequence of non-empty segments. `"/a/b/c"` and
//! `"a/b/c"` parse to the same path; trailing separators, empty segments,
//! `.`/`..` and segments containing `*` are rejected.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::constants::PATH_SEPARATOR;
use crate::StoreError;

#[cfg(test)]
mod path_test;

/// Normalized, cheaply clonable path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Arc<[String]>,
}

impl Path {
    /// Parses and validates a path string.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let segments = split_segments(raw).map_err(|reason| StoreError::InvalidPath {
            path: raw.to_string(),
            reason,
        })?;

        if let Some(bad) = segments.iter().find(|s| s.contains('*')) {
            return Err(StoreError::InvalidPath {
                path: raw.to_string(),
                reason: format!("segment {bad:?} contains reserved character '*'"),
            });
        }

        Ok(Self::from_validated(segments.into_iter().map(str::to_string).collect()))
    }

    /// Builds a path from segments that already passed validation.
    pub(crate) fn from_validated(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty());
        Self {
            segments: segments.into(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Rejects paths deeper or wider than the configured bounds.
    pub(crate) fn check_limits(
        &self,
        max_depth: usize,
        max_segment_len: usize,
    ) -> Result<(), StoreError> {
        if self.depth() > max_depth {
            return Err(StoreError::InvalidPath {
                path: self.to_string(),
                reason: format!("depth {} exceeds limit {}", self.depth(), max_depth),
            });
        }
        if let Some(long) = self.segments.iter().find(|s| s.len() > max_segment_len) {
            return Err(StoreError::InvalidPath {
                path: self.to_string(),
                reason: format!(
                    "segment of {} bytes exceeds limit {}",
                    long.len(),
                    max_segment_len
                ),
            });
        }
        Ok(())
    }
}

/// Splits `raw` on the separator, stripping one optional leading separator.
///
/// Shared by path and pattern parsing; the error is a human readable reason.
pub(crate) fn split_segments(raw: &str) -> Result<Vec<&str>, String> {
    let body = raw.strip_prefix(PATH_SEPARATOR).unwrap_or(raw);
    if body.is_empty() {
        return Err("path must contain at least one segment".to_string());
    }
    if body.ends_with(PATH_SEPARATOR) {
        return Err("trailing separator".to_string());
    }

    let segments: Vec<&str> = body.split(PATH_SEPARATOR).collect();
    for segment in &segments {
        match *segment {
            "" => return Err("empty segment".to_string()),
            "." | ".." => return Err(format!("relative segment {segment:?}")),
            _ => {}
        }
    }
    Ok(segments)
}

impl fmt::Display for Path {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for segment in self.segments.iter() {
            write!(f, "{PATH_SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl std::str::FromStr for Path {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Path::parse(&raw).map_err(serde::de::Error::custom)
    }
}
