//! Asset memoization
//!
//! Policy parsing lives in [`spec`], the concurrent store in [`store`].

pub mod spec;
pub mod store;

pub use spec::{BoundedPolicy, CachePolicy, CacheSpecError, DEFAULT_CACHE_SPEC, DISABLED_CACHE_SPEC};
pub use store::{AssetCache, CacheStats};
