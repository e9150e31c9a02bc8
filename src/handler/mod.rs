//! Request handler module
//!
//! [`assets`] answers requests for one mount; [`router`] picks the mount.

pub mod assets;
pub mod router;

pub use assets::AssetHandler;
pub use router::{build_mounts, handle_request, AppState, MountTable};
