//! Resolver chain
//!
//! Sources are consulted in fixed precedence: overrides, then the filesystem
//! root, then the embedded resource root. The first asset produced wins.
//! Override lookups are exposed separately so they can bypass memoization.

use super::embedded::ResourceRoot;
use super::filesystem::FilesystemRoot;
use super::overrides::OverrideTable;
use super::path::RelativePath;
use crate::asset::Asset;
use crate::config::MountConfig;
use crate::error::AssetError;
use crate::logger;

#[derive(Debug, Clone)]
pub struct ResolverChain {
    uri_prefix: String,
    overrides: OverrideTable,
    filesystem: Option<FilesystemRoot>,
    resources: Option<ResourceRoot>,
    index_file: Option<String>,
}

impl ResolverChain {
    pub fn new(mount: &MountConfig) -> Self {
        Self {
            uri_prefix: mount.uri_prefix.clone(),
            overrides: mount.overrides.clone(),
            filesystem: mount.filesystem_root.clone().map(FilesystemRoot::new),
            resources: mount.resource_root.clone(),
            index_file: mount.index_file.clone(),
        }
    }

    /// Resolve a relative path, absorbing failures
    ///
    /// I/O errors are logged and reported as a missing asset.
    pub async fn resolve(&self, rel: &RelativePath) -> Option<Asset> {
        self.absorb(rel, self.try_resolve(rel).await)
    }

    /// Resolve through the overrides alone
    ///
    /// Override targets are files under active edit, so callers re-run this
    /// on every request instead of memoizing it.
    pub async fn resolve_override(&self, rel: &RelativePath) -> Option<Asset> {
        self.absorb(rel, self.try_resolve_override(rel).await)
    }

    /// Resolve through the filesystem and embedded roots, skipping overrides
    pub async fn resolve_sources(&self, rel: &RelativePath) -> Option<Asset> {
        self.absorb(rel, self.try_resolve_sources(rel).await)
    }

    /// Resolve a relative path, surfacing the first source failure
    pub async fn try_resolve(&self, rel: &RelativePath) -> Result<Option<Asset>, AssetError> {
        if let Some(asset) = self.try_resolve_override(rel).await? {
            return Ok(Some(asset));
        }
        self.try_resolve_sources(rel).await
    }

    async fn try_resolve_override(&self, rel: &RelativePath) -> Result<Option<Asset>, AssetError> {
        if self.overrides.is_empty() {
            return Ok(None);
        }
        let request_path = format!("{}{}", self.uri_prefix, rel.decoded());
        self.overrides.load(&request_path, self.index_file.as_deref()).await
    }

    async fn try_resolve_sources(&self, rel: &RelativePath) -> Result<Option<Asset>, AssetError> {
        let index = self.index_file.as_deref();

        if let Some(root) = &self.filesystem {
            if let Some(asset) = root.load(rel, index).await? {
                return Ok(Some(asset));
            }
        }

        match &self.resources {
            Some(root) => root.load(rel, index),
            None => Ok(None),
        }
    }

    fn absorb(&self, rel: &RelativePath, result: Result<Option<Asset>, AssetError>) -> Option<Asset> {
        match result {
            Ok(asset) => asset,
            Err(e) => {
                logger::log_resolve_failure(&self.uri_prefix, rel.key(), &e);
                None
            }
        }
    }
}
