//! Path overrides
//!
//! An override redirects a request path, or every path below it, to a
//! location on disk. Keys are compared against the full request path (mount
//! prefix included) in declaration order.
//!
//! Prefix matching is character-wise by default: an override for `/js` also
//! catches `/jsx/app.js`, which is then served from `<fs_path>/x/app.js`.
//! [`OverrideMatch::Boundary`] restricts prefix matches to whole segments.

use std::path::PathBuf;

use super::filesystem::load_target;
use crate::asset::Asset;
use crate::error::AssetError;

/// How an override key matches paths other than itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrideMatch {
    /// `starts_with` on characters
    #[default]
    Prefix,
    /// `starts_with` on whole `/`-separated segments
    Boundary,
}

/// One `url_key -> fs_path` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub url_key: String,
    pub fs_path: PathBuf,
}

impl Override {
    pub fn new(url_key: impl Into<String>, fs_path: impl Into<PathBuf>) -> Self {
        Self {
            url_key: url_key.into(),
            fs_path: fs_path.into(),
        }
    }

    /// Filesystem candidate for `request_path`, if this entry matches it
    pub fn candidate(&self, request_path: &str, matching: OverrideMatch) -> Option<PathBuf> {
        if request_path == self.url_key {
            return Some(self.fs_path.clone());
        }
        let suffix = request_path.strip_prefix(self.url_key.as_str())?;
        if matching == OverrideMatch::Boundary
            && !self.url_key.ends_with('/')
            && !suffix.starts_with('/')
        {
            return None;
        }
        let suffix = suffix.trim_start_matches('/');
        if suffix.is_empty() {
            Some(self.fs_path.clone())
        } else {
            Some(self.fs_path.join(suffix))
        }
    }
}

/// Ordered override entries for one mount
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: Vec<Override>,
    matching: OverrideMatch,
}

impl OverrideTable {
    pub const fn new(entries: Vec<Override>, matching: OverrideMatch) -> Self {
        Self { entries, matching }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Override] {
        &self.entries
    }

    pub const fn matching(&self) -> OverrideMatch {
        self.matching
    }

    /// Serve the first matching entry whose target exists
    ///
    /// A matching entry with a missing target is skipped in favour of the next
    /// entry; `Ok(None)` means no entry produced an asset.
    pub async fn load(&self, request_path: &str, index_file: Option<&str>) -> Result<Option<Asset>, AssetError> {
        for entry in &self.entries {
            let Some(target) = entry.candidate(request_path, self.matching) else {
                continue;
            };
            if let Some(asset) = load_target(&target, index_file).await? {
                return Ok(Some(asset));
            }
        }
        Ok(None)
    }
}
