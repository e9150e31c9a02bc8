//! Static asset serving core
//!
//! Maps URL prefixes ("mounts") to embedded resource trees or directories on
//! disk and answers `GET`/`HEAD` with validators (`ETag`, `Last-Modified`),
//! conditional `304`s and a bounded single-flight cache.

pub mod asset;
pub mod cache;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resolve;
pub mod server;

pub use asset::Asset;
pub use cache::{AssetCache, CachePolicy};
pub use config::{AssetsConfig, Config, MountConfig};
pub use handler::{AssetHandler, MountTable};
