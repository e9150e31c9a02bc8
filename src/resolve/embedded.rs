//! Embedded resource trees
//!
//! Assets baked into the binary are reached through [`ResourceTree`]. The
//! crate ships two implementations: [`include_dir::Dir`] for trees embedded
//! at compile time, and [`MemoryTree`] for bytes registered at runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use hyper::body::Bytes;
use include_dir::{Dir, DirEntry};

use super::path::RelativePath;
use crate::asset::{now_millis, system_time_to_millis, Asset};
use crate::error::AssetError;

/// A node inside an embedded tree
#[derive(Debug, Clone)]
pub enum ResourceNode {
    File {
        contents: Bytes,
        modified: Option<SystemTime>,
    },
    Dir,
}

/// Read-only tree of embedded resources addressed by `/`-separated paths
///
/// Paths carry no leading or trailing `/`; the empty path is the tree root.
pub trait ResourceTree: Send + Sync + 'static {
    fn lookup(&self, path: &str) -> Option<ResourceNode>;
}

impl ResourceTree for Dir<'static> {
    fn lookup(&self, path: &str) -> Option<ResourceNode> {
        if path.is_empty() {
            return Some(ResourceNode::Dir);
        }
        match self.get_entry(path)? {
            DirEntry::Dir(_) => Some(ResourceNode::Dir),
            DirEntry::File(file) => Some(ResourceNode::File {
                contents: Bytes::from_static(file.contents()),
                modified: file.metadata().map(|meta| meta.modified()),
            }),
        }
    }
}

/// In-memory tree; directories exist implicitly as prefixes of file paths
#[derive(Debug, Default, Clone)]
pub struct MemoryTree {
    files: BTreeMap<String, (Bytes, Option<SystemTime>)>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; leading and trailing `/` in `path` are ignored
    #[must_use]
    pub fn with_file(
        mut self,
        path: &str,
        contents: impl Into<Bytes>,
        modified: Option<SystemTime>,
    ) -> Self {
        self.insert(path, contents, modified);
        self
    }

    pub fn insert(&mut self, path: &str, contents: impl Into<Bytes>, modified: Option<SystemTime>) {
        self.files
            .insert(path.trim_matches('/').to_string(), (contents.into(), modified));
    }
}

impl ResourceTree for MemoryTree {
    fn lookup(&self, path: &str) -> Option<ResourceNode> {
        if let Some((contents, modified)) = self.files.get(path) {
            return Some(ResourceNode::File {
                contents: contents.clone(),
                modified: *modified,
            });
        }
        let dir_prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        self.files
            .range(dir_prefix.clone()..)
            .next()
            .filter(|(key, _)| key.starts_with(&dir_prefix))
            .map(|_| ResourceNode::Dir)
    }
}

/// An embedded tree together with the base directory a mount serves from
#[derive(Clone)]
pub struct ResourceRoot {
    tree: Arc<dyn ResourceTree>,
    base: String,
}

impl fmt::Debug for ResourceRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRoot")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl ResourceRoot {
    /// Root a mount at `base` inside `tree`
    ///
    /// Returns `None` when `base` is not a directory of the tree.
    pub fn new(tree: Arc<dyn ResourceTree>, base: &str) -> Option<Self> {
        let base = base.trim_matches('/').to_string();
        match tree.lookup(&base)? {
            ResourceNode::Dir => Some(Self { tree, base }),
            ResourceNode::File { .. } => None,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn full_path(&self, rel: &str) -> String {
        match (self.base.is_empty(), rel.is_empty()) {
            (true, _) => rel.to_string(),
            (false, true) => self.base.clone(),
            (false, false) => format!("{}/{rel}", self.base),
        }
    }

    /// Resolve a relative path, descending into `index_file` for directories
    pub fn load(&self, rel: &RelativePath, index_file: Option<&str>) -> Result<Option<Asset>, AssetError> {
        let mut path = self.full_path(&rel.tree_path());
        let mut node = self.tree.lookup(&path);

        if matches!(node, Some(ResourceNode::Dir)) {
            let Some(index) = index_file else {
                return Ok(None);
            };
            path = format!("{path}/{index}").trim_start_matches('/').to_string();
            node = self.tree.lookup(&path);
        }

        match node {
            None => Ok(None),
            Some(ResourceNode::Dir) => Err(AssetError::Embedded(path)),
            Some(ResourceNode::File { contents, modified }) => {
                Ok(Some(Asset::new(contents, embedded_modified_ms(modified))))
            }
        }
    }
}

/// Modification time of an embedded entry, falling back to now when unknown
fn embedded_modified_ms(modified: Option<SystemTime>) -> i64 {
    modified
        .map(system_time_to_millis)
        .filter(|ms| *ms > 0)
        .unwrap_or_else(now_millis)
}
