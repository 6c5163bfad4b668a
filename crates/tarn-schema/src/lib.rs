//! Shared vocabulary for tarn.
//!
//! Plain data only: the newtype used as the registry key, the shape of a
//! dependency entry, small enums for install modes and lifecycle activities,
//! and the TOML manifest format packages are described in. Both the core
//! library and the CLI depend on this crate so that they agree on names and
//! file formats.

pub mod manifest;
pub mod types;

pub use manifest::{ManifestError, PackageManifest, load_dir};
pub use types::*;
