//! Validated mount configuration
//!
//! [`AssetsConfig::build_mount`] turns a deserialized `[[mounts]]` table into
//! the immutable [`MountConfig`] a handler is built from.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use super::types::AssetsConfig;
use crate::cache::{CachePolicy, CacheSpecError};
use crate::resolve::{Override, OverrideMatch, OverrideTable, ResourceRoot, ResourceTree};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] config::ConfigError),

    #[error("invalid cache spec")]
    CacheSpec(#[from] CacheSpecError),

    #[error("resource path `{0}` must start with `/` and must not be `/`")]
    InvalidResourcePath(String),

    #[error("resource path `{0}` is not a directory in the embedded tree")]
    MissingResourceRoot(String),
}

/// Everything a mount needs at request time
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// Request path prefix, without trailing `/` or `*`
    pub uri_prefix: String,
    pub resource_root: Option<ResourceRoot>,
    /// Live source directory; mutually exclusive with caching in practice
    pub filesystem_root: Option<PathBuf>,
    pub overrides: OverrideTable,
    pub index_file: Option<String>,
    pub default_content_type: String,
    pub extra_mime_types: HashMap<String, String>,
    pub cache_policy: CachePolicy,
    pub cache_control: Option<String>,
}

/// Strip one trailing `*`, then one trailing `/`
fn normalize_prefix(value: &str) -> String {
    let value = value.strip_suffix('*').unwrap_or(value);
    value.strip_suffix('/').unwrap_or(value).to_string()
}

impl AssetsConfig {
    /// Validate this table and build its mount
    ///
    /// `tree` is the embedded resource tree the mount reads from; the
    /// configured `resource_path` must name a directory inside it.
    pub fn build_mount(&self, tree: Option<Arc<dyn ResourceTree>>) -> Result<MountConfig, ConfigError> {
        let resource_path = self.resource_path.trim();
        if !resource_path.starts_with('/') || resource_path == "/" {
            return Err(ConfigError::InvalidResourcePath(self.resource_path.clone()));
        }

        let resource_root = match tree {
            Some(tree) => Some(
                ResourceRoot::new(tree, resource_path)
                    .ok_or_else(|| ConfigError::MissingResourceRoot(self.resource_path.clone()))?,
            ),
            None => None,
        };

        let filesystem_root = self
            .file_path
            .as_deref()
            .map(normalize_prefix)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        // Live-reload mode: every request must observe the file on disk
        let cache_policy = if filesystem_root.is_some() {
            CachePolicy::Disabled
        } else {
            CachePolicy::parse(&self.cache_spec)?
        };

        let matching = if self.strict_overrides {
            OverrideMatch::Boundary
        } else {
            OverrideMatch::Prefix
        };
        let overrides = self
            .overrides
            .iter()
            .map(|o| Override::new(o.url.as_str(), o.path.as_str()))
            .collect();

        let index_file = Some(self.index_file.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        Ok(MountConfig {
            uri_prefix: normalize_prefix(&self.uri_path),
            resource_root,
            filesystem_root,
            overrides: OverrideTable::new(overrides, matching),
            index_file,
            default_content_type: self.default_content_type.clone(),
            extra_mime_types: self.mime_types.clone(),
            cache_policy,
            cache_control: self.cache_control_header.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BoundedPolicy;
    use crate::config::OverrideEntry;
    use crate::resolve::MemoryTree;

    fn tree() -> Option<Arc<dyn ResourceTree>> {
        let tree = MemoryTree::new().with_file("assets/index.htm", "<p>hi</p>", None);
        Some(Arc::new(tree))
    }

    #[test]
    fn test_defaults() {
        let mount = AssetsConfig::default().build_mount(tree()).unwrap();
        assert_eq!(mount.uri_prefix, "/assets");
        assert_eq!(mount.resource_root.as_ref().map(ResourceRoot::base), Some("assets"));
        assert_eq!(mount.filesystem_root, None);
        assert_eq!(mount.index_file.as_deref(), Some("index.htm"));
        assert_eq!(mount.default_content_type, "text/html");
        assert_eq!(mount.cache_policy, CachePolicy::default());
        assert!(mount.overrides.is_empty());
        assert_eq!(mount.cache_control, None);
    }

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(normalize_prefix("/js/*"), "/js");
        assert_eq!(normalize_prefix("/js/"), "/js");
        assert_eq!(normalize_prefix("/js*"), "/js");
        assert_eq!(normalize_prefix("/js"), "/js");
        assert_eq!(normalize_prefix("/"), "");
    }

    #[test]
    fn test_root_mount() {
        let config = AssetsConfig {
            uri_path: "/".to_string(),
            ..AssetsConfig::default()
        };
        assert_eq!(config.build_mount(tree()).unwrap().uri_prefix, "");
    }

    #[test]
    fn test_file_path_disables_cache() {
        let config = AssetsConfig {
            file_path: Some("/srv/app/assets/".to_string()),
            cache_spec: "maximumSize=500".to_string(),
            ..AssetsConfig::default()
        };
        let mount = config.build_mount(tree()).unwrap();
        assert_eq!(mount.filesystem_root, Some(PathBuf::from("/srv/app/assets")));
        assert!(mount.cache_policy.is_disabled());
    }

    #[test]
    fn test_cache_spec_parsed() {
        let config = AssetsConfig {
            cache_spec: "maximumWeight=2048".to_string(),
            ..AssetsConfig::default()
        };
        let mount = config.build_mount(tree()).unwrap();
        assert_eq!(
            mount.cache_policy,
            CachePolicy::Bounded(BoundedPolicy {
                max_weight: Some(2048),
                ..BoundedPolicy::default()
            })
        );
    }

    #[test]
    fn test_bad_cache_spec() {
        let config = AssetsConfig {
            cache_spec: "maximumSize=lots".to_string(),
            ..AssetsConfig::default()
        };
        assert!(matches!(config.build_mount(tree()), Err(ConfigError::CacheSpec(_))));
    }

    #[test]
    fn test_resource_path_validation() {
        for bad in ["/", "assets", ""] {
            let config = AssetsConfig {
                resource_path: bad.to_string(),
                ..AssetsConfig::default()
            };
            assert!(
                matches!(config.build_mount(tree()), Err(ConfigError::InvalidResourcePath(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_resource_root() {
        let config = AssetsConfig {
            resource_path: "/nope".to_string(),
            ..AssetsConfig::default()
        };
        assert!(matches!(config.build_mount(tree()), Err(ConfigError::MissingResourceRoot(_))));
        // Without a tree the base is not checked
        assert!(config.build_mount(None).unwrap().resource_root.is_none());
    }

    #[test]
    fn test_empty_index_disables() {
        let config = AssetsConfig {
            index_file: String::new(),
            ..AssetsConfig::default()
        };
        assert_eq!(config.build_mount(tree()).unwrap().index_file, None);
    }

    #[test]
    fn test_overrides_keep_order() {
        let config = AssetsConfig {
            overrides: vec![
                OverrideEntry {
                    url: "/assets/a".to_string(),
                    path: "/tmp/a".to_string(),
                },
                OverrideEntry {
                    url: "/assets".to_string(),
                    path: "/tmp/all".to_string(),
                },
            ],
            strict_overrides: true,
            ..AssetsConfig::default()
        };
        let mount = config.build_mount(tree()).unwrap();
        let keys: Vec<_> = mount.overrides.entries().iter().map(|o| o.url_key.as_str()).collect();
        assert_eq!(keys, ["/assets/a", "/assets"]);
        assert_eq!(mount.overrides.matching(), OverrideMatch::Boundary);
    }
}
