//! Filesystem-backed assets
//!
//! Files are read fully into memory on every load; nothing keeps a descriptor
//! open afterwards.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use hyper::body::Bytes;
use tokio::fs;

use super::path::RelativePath;
use crate::asset::Asset;
use crate::error::AssetError;
use crate::logger;

/// Load the file at `target`, descending into `index_file` for directories
///
/// Returns `Ok(None)` when the target (or its index) does not exist, or when
/// it is a directory and no index file is configured.
pub async fn load_target(target: &Path, index_file: Option<&str>) -> Result<Option<Asset>, AssetError> {
    match file_for(target, index_file).await? {
        Some(file) => read_asset(&file).await,
        None => Ok(None),
    }
}

/// The regular file a request for `target` reads
async fn file_for(target: &Path, index_file: Option<&str>) -> Result<Option<PathBuf>, AssetError> {
    let Some(meta) = metadata(target).await? else {
        return Ok(None);
    };

    if !meta.is_dir() {
        return Ok(Some(target.to_path_buf()));
    }

    let Some(index) = index_file else {
        return Ok(None);
    };
    let index_path = target.join(index);
    match metadata(&index_path).await? {
        Some(meta) if !meta.is_dir() => Ok(Some(index_path)),
        _ => Ok(None),
    }
}

/// Read a file into an [`Asset`], stamping it with the file's mtime
pub async fn read_asset(path: &Path) -> Result<Option<Asset>, AssetError> {
    // mtime is sampled before the bytes are read
    let Some(meta) = metadata(path).await? else {
        return Ok(None);
    };
    let modified = meta.modified().map_err(|e| AssetError::io(path, e))?;
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AssetError::io(path, e)),
    };
    Ok(Some(Asset::with_modified(Bytes::from(bytes), modified)))
}

async fn metadata(path: &Path) -> Result<Option<std::fs::Metadata>, AssetError> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(None),
        Err(e) => Err(AssetError::io(path, e)),
    }
}

/// A live directory on disk serving as a mount's source tree
#[derive(Debug, Clone)]
pub struct FilesystemRoot {
    root: PathBuf,
}

impl FilesystemRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a relative path below the root
    ///
    /// Symlinks that lead outside the root are treated as missing, including
    /// an index file reached through a directory.
    pub async fn load(&self, rel: &RelativePath, index_file: Option<&str>) -> Result<Option<Asset>, AssetError> {
        let target = rel.join_to(&self.root);
        let Some(file) = file_for(&target, index_file).await? else {
            return Ok(None);
        };
        if !self.contains(&file, rel).await? {
            return Ok(None);
        }
        read_asset(&file).await
    }

    async fn contains(&self, target: &Path, rel: &RelativePath) -> Result<bool, AssetError> {
        let root = match fs::canonicalize(&self.root).await {
            Ok(p) => p,
            Err(e) => {
                logger::log_warning(&format!(
                    "Filesystem root not found or inaccessible '{}': {e}",
                    self.root.display()
                ));
                return Ok(false);
            }
        };
        let resolved = match fs::canonicalize(target).await {
            Ok(p) => p,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(false)
            }
            Err(e) => return Err(AssetError::io(target, e)),
        };
        if resolved.starts_with(&root) {
            return Ok(true);
        }
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            rel.decoded(),
            resolved.display()
        ));
        Ok(false)
    }
}
