//! Asset resolution
//!
//! Turns a mount-relative request path into an [`Asset`](crate::asset::Asset)
//! by consulting overrides, a live filesystem root and an embedded tree.

pub mod chain;
pub mod embedded;
pub mod filesystem;
pub mod overrides;
pub mod path;

pub use chain::ResolverChain;
pub use embedded::{MemoryTree, ResourceNode, ResourceRoot, ResourceTree};
pub use filesystem::FilesystemRoot;
pub use overrides::{Override, OverrideMatch, OverrideTable};
pub use path::{strip_prefix, PrefixMismatch, RelativePath};
