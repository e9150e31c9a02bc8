//! Error types for asset resolution.
//!
//! Resolution errors never reach a client: the resolver chain logs them and
//! treats the asset as absent. Startup-time errors live with their owners
//! ([`crate::config::ConfigError`], [`crate::cache::CacheSpecError`]).

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading an asset from one of its sources
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("embedded resource `{0}` could not be read")]
    Embedded(String),
}

impl AssetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io(path.into(), source)
    }
}
