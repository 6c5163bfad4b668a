//! Built-in package kinds.
//!
//! Manifests map onto a kind by their `kind` field: `local` packages are
//! built by tarn, `library` and `command` packages are only detected.

pub mod local;
pub mod system;

pub use local::LocalPackage;
pub use system::{Compiler, SystemCommand, SystemLibrary};

use tarn_schema::{PackageKind, PackageManifest};

use crate::package::Package;
use crate::system::System;

/// Create the package a manifest describes.
pub fn from_manifest(manifest: PackageManifest, system: &System) -> Box<dyn Package> {
    match manifest.package.kind {
        PackageKind::Local => Box::new(LocalPackage::new(manifest, system)),
        PackageKind::Library => Box::new(SystemLibrary::new(manifest, system)),
        PackageKind::Command => Box::new(SystemCommand::new(manifest, system)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_kind_dispatch() {
        let system = System::new(Config::new("/tmp/tarn-cache", "/tmp/tarn-install"));
        let cases = [
            ("[package]\nname = \"a\"\nkind = \"local\"\n[source]\nurl = \"https://example.org/a.tar.gz\"\n", true),
            ("[package]\nname = \"b\"\nkind = \"library\"\n[detect]\nlibrary = \"m\"\n", false),
            ("[package]\nname = \"c\"\nkind = \"command\"\n", false),
        ];
        for (src, installable) in cases {
            let manifest: PackageManifest = toml::from_str(src).unwrap();
            let kind = manifest.package.kind;
            let package = from_manifest(manifest, &system);
            assert_eq!(package.kind(), kind);
            assert_eq!(package.as_installable().is_some(), installable);
            assert_eq!(kind.is_installable(), installable);
        }
    }
}
