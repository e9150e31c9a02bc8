//! Request path normalization
//!
//! Strips the mount prefix from a request path and validates what remains
//! before any source is consulted.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// The request path does not belong to this mount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request path `{path}` is outside mount `{prefix}`")]
pub struct PrefixMismatch {
    pub path: String,
    pub prefix: String,
}

/// Remove `prefix` from the front of `uri_path`
///
/// The remainder must be empty or start with `/`; `/jsx/a.js` is not under
/// the mount `/js`.
pub fn strip_prefix<'a>(uri_path: &'a str, prefix: &str) -> Result<&'a str, PrefixMismatch> {
    match uri_path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => Ok(rest),
        _ => Err(PrefixMismatch {
            path: uri_path.to_string(),
            prefix: prefix.to_string(),
        }),
    }
}

/// A validated path relative to a mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePath {
    key: String,
    decoded: String,
    segments: Vec<String>,
}

impl RelativePath {
    /// Validate a raw relative path as it appears in the request URI
    ///
    /// Returns `None` for paths that must resolve to "not found": `.` or `..`
    /// segments, backslashes, NUL bytes, or invalid percent-encoding.
    pub fn parse(raw: &str) -> Option<Self> {
        let decoded = percent_decode_str(raw).decode_utf8().ok()?.into_owned();

        let mut segments = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" => {}
                "." | ".." => return None,
                s if s.contains(['\\', '\0']) => return None,
                s => segments.push(s.to_string()),
            }
        }

        Some(Self {
            key: raw.to_string(),
            decoded,
            segments,
        })
    }

    /// Raw form, used as the cache key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Percent-decoded form, leading `/` preserved
    pub fn decoded(&self) -> &str {
        &self.decoded
    }

    /// Non-empty path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when the path names the mount root itself
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments joined with `/`, without leading or trailing separators
    pub fn tree_path(&self) -> String {
        self.segments.join("/")
    }

    /// Join the segments onto a filesystem directory
    pub fn join_to(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        path.extend(&self.segments);
        path
    }
}
