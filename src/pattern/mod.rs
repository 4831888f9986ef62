//! Subscription patterns and path matching.
//!
//! # Grammar
//!
//! A pattern uses the same separator rules as a [`Path`]. Every segment is one of:
//!
//! - a literal, matched byte-for-byte (case-sensitive)
//! - `*`, matching exactly one arbitrary segment
//! - `**`, matching zero or more arbitrary segments
//!
//! `**` may appear at most once, at any position. Partial wildcards such as
//! `user*` are rejected: wildcards always cover whole segments.
//!
//! ```
//! use pathkv::{Path, Pattern};
//!
//! let pattern = Pattern::parse("users/*/profile").unwrap();
//! assert!(pattern.matches(&Path::parse("/users/42/profile").unwrap()));
//! assert!(!pattern.matches(&Path::parse("/users/42/posts/1").unwrap()));
//!
//! let deep = Pattern::parse("logs/**").unwrap();
//! assert!(deep.matches(&Path::parse("/logs/2024/05/01").unwrap()));
//! ```
//!
//! # Complexity
//!
//! With a single `**` a pattern splits into a prefix and a suffix, each compared
//! against a fixed window of the path. Matching is O(pattern + path) and never
//! backtracks.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::constants::MULTI_SEGMENT_WILDCARD;
use crate::constants::PATH_SEPARATOR;
use crate::constants::SINGLE_SEGMENT_WILDCARD;
use crate::path::split_segments;
use crate::Path;
use crate::WatchError;


/// One segment matcher of a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    /// `*`
    Any,
    /// `**`
    AnyDepth,
}

impl Segment {
    fn matches(
        &self,
        segment: &str,
    ) -> bool {
        match self {
            Segment::Literal(literal) => literal == segment,
            Segment::Any => true,
            Segment::AnyDepth => unreachable!("`**` is split off before segment comparison"),
        }
    }
}

/// Immutable, parsed subscription pattern.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    segments: Arc<[Segment]>,
    /// Position of the `**` segment, if any
    any_depth: Option<usize>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, WatchError> {
        let syntax_error = |reason: String| WatchError::PatternSyntax {
            pattern: raw.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut any_depth = None;

        for (index, segment) in split_segments(raw).map_err(syntax_error)?.into_iter().enumerate() {
            let parsed = match segment {
                MULTI_SEGMENT_WILDCARD => {
                    if any_depth.is_some() {
                        return Err(syntax_error(format!(
                            "`{MULTI_SEGMENT_WILDCARD}` may appear at most once"
                        )));
                    }
                    any_depth = Some(index);
                    Segment::AnyDepth
                }
                SINGLE_SEGMENT_WILDCARD => Segment::Any,
                literal if literal.contains('*') => {
                    return Err(syntax_error(format!(
                        "partial wildcard in segment {literal:?}"
                    )));
                }
                literal => Segment::Literal(literal.to_string()),
            };
            segments.push(parsed);
        }

        Ok(Self {
            segments: segments.into(),
            any_depth,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern has no `*` or `**` segment.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// The single path a wildcard-free pattern selects.
    pub fn literal_path(&self) -> Option<Path> {
        if !self.is_literal() {
            return None;
        }
        let segments = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Literal(literal) => literal.clone(),
                _ => unreachable!("checked by is_literal"),
            })
            .collect();
        Some(Path::from_validated(segments))
    }

    pub fn matches(
        &self,
        path: &Path,
    ) -> bool {
        let target = path.segments();

        match self.any_depth {
            None => match_exact(&self.segments, target),
            Some(split) => {
                let prefix = &self.segments[..split];
                let suffix = &self.segments[split + 1..];
                if target.len() < prefix.len() + suffix.len() {
                    return false;
                }
                match_exact(prefix, &target[..prefix.len()])
                    && match_exact(suffix, &target[target.len() - suffix.len()..])
            }
        }
    }
}

/// Free-function form of [`Pattern::matches`].
pub fn matches(
    pattern: &Pattern,
    path: &Path,
) -> bool {
    pattern.matches(path)
}

fn match_exact(
    pattern: &[Segment],
    target: &[String],
) -> bool {
    pattern.len() == target.len() && pattern.iter().zip(target).all(|(p, s)| p.matches(s))
}

impl fmt::Display for Pattern {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for segment in self.segments.iter() {
            let text = match segment {
                Segment::Literal(literal) => literal.as_str(),
                Segment::Any => SINGLE_SEGMENT_WILDCARD,
                Segment::AnyDepth => MULTI_SEGMENT_WILDCARD,
            };
            write!(f, "{PATH_SEPARATOR}{text}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Pattern({self})")
    }
}

impl std::str::FromStr for Pattern {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::parse(s)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pattern::parse(&raw).map_err(serde::de::Error::custom)
    }
}
