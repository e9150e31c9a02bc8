// Configuration types module
// Deserialized shapes of the config file; see `mount` for the validated form

use serde::Deserialize;
use std::collections::HashMap;

use crate::cache::DEFAULT_CACHE_SPEC;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub mounts: Vec<AssetsConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Upper bound on the lifetime of one connection, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Most verbose level written: error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// One `[[mounts]]` table
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AssetsConfig {
    /// URL prefix the mount answers under
    #[serde(default = "default_assets_path")]
    pub uri_path: String,
    /// Base directory inside the embedded resource tree
    #[serde(default = "default_assets_path")]
    pub resource_path: String,
    /// Source directory served live instead of the embedded copy
    #[serde(default)]
    pub file_path: Option<String>,
    /// Served for directory requests; empty disables
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_content_type")]
    pub default_content_type: String,
    #[serde(default = "default_cache_spec")]
    pub cache_spec: String,
    /// Checked in declaration order
    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,
    /// Extension -> content type, merged over the built-in table
    #[serde(default)]
    pub mime_types: HashMap<String, String>,
    /// Emitted verbatim as `Cache-Control` on 200 responses
    #[serde(default)]
    pub cache_control_header: Option<String>,
    /// Prefix overrides only match at a `/` boundary
    #[serde(default)]
    pub strict_overrides: bool,
}

/// `[[mounts.overrides]]` entry
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    pub url: String,
    pub path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_assets_path() -> String {
    "/assets".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_index_file() -> String {
    "index.htm".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_content_type() -> String {
    "text/html".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_cache_spec() -> String {
    DEFAULT_CACHE_SPEC.to_string()
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            uri_path: default_assets_path(),
            resource_path: default_assets_path(),
            file_path: None,
            index_file: default_index_file(),
            default_content_type: default_content_type(),
            cache_spec: default_cache_spec(),
            overrides: Vec::new(),
            mime_types: HashMap::new(),
            cache_control_header: None,
            strict_overrides: false,
        }
    }
}
