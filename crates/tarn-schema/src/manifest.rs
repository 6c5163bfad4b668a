//! TOML package manifests.
//!
//! Each file in the packages directory describes one package:
//!
//! ```toml
//! [package]
//! name = "geant4"
//! version = "9.5.p01"
//! kind = "local"
//! mode = "graphical"
//!
//! [[dependencies]]
//! name = "clhep"
//!
//! [[dependencies]]
//! any_of = ["curl", "wget"]
//!
//! [source]
//! url = "https://example.org/geant4.9.5.p01.tar.gz"
//!
//! [build]
//! script = "./configure --prefix=$PREFIX && make -j$JOBS install"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Dependency, InstallMode, PackageKind, PackageName};

/// Errors that can occur when loading or parsing a package manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML content could not be deserialized into a manifest.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// The manifest parsed but describes an impossible package.
    #[error("invalid manifest {}: {reason}", path.display())]
    Invalid {
        /// Offending file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
}

/// Identity and presentation of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestInfo {
    /// Registry key.
    pub name: PackageName,
    /// Version string. Local packages record it in their install marker.
    #[serde(default)]
    pub version: String,
    /// How the package is provided.
    pub kind: PackageKind,
    /// Install mode the package requires, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<InstallMode>,
    /// Guidance shown when tarn cannot manage the package.
    #[serde(default)]
    pub help: String,
}

/// Dependency entry as written in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// `{ name = "clhep" }`
    Required {
        /// Package that must be installed.
        name: PackageName,
    },
    /// `{ any_of = ["curl", "wget"] }`
    AnyOf {
        /// Alternatives; the first is the default.
        any_of: Vec<PackageName>,
    },
}

impl From<DependencySpec> for Dependency {
    fn from(spec: DependencySpec) -> Self {
        match spec {
            DependencySpec::Required { name } => Self::Required(name),
            DependencySpec::AnyOf { any_of } => Self::AnyOf(any_of),
        }
    }
}

/// Credential scheme a source accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    /// GitHub style: a token in the `Authorization` header or a username.
    Github,
}

/// Where a local package's source archive comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Download URL of the archive.
    pub url: String,
    /// Expected SHA-256 of the archive, hex encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Credential scheme, when the source needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthKind>,
}

/// How a local package is built once extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Shell script run in the source directory. Empty means nothing to build.
    #[serde(default)]
    pub script: String,
}

/// How a system package is detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectSpec {
    /// Headers that must compile.
    #[serde(default)]
    pub headers: Vec<String>,
    /// Library that must link (without the `lib` prefix).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    /// Extra compiler flags for the test compile.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Command that must be on `PATH`. Defaults to the package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// A parsed package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Identity and presentation.
    pub package: ManifestInfo,
    /// Dependency entries, in order.
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    /// Source archive (local packages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceSpec>,
    /// Build instructions (local packages).
    #[serde(default)]
    pub build: BuildSpec,
    /// Detection rules (library and command packages).
    #[serde(default)]
    pub detect: DetectSpec,
}

impl PackageManifest {
    /// Parse and validate a manifest file.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Io` if the file cannot be read,
    /// `ManifestError::Parse` if the TOML does not match the schema, or
    /// `ManifestError::Invalid` if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Self = toml::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        manifest
            .validate()
            .map_err(|reason| ManifestError::Invalid {
                path: path.to_path_buf(),
                reason,
            })?;
        Ok(manifest)
    }

    /// Check the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// A human-readable reason for the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.package.name.is_empty() {
            return Err("package name is empty".to_string());
        }
        for dep in &self.dependencies {
            match dep {
                DependencySpec::Required { name } if name.is_empty() => {
                    return Err("dependency name is empty".to_string());
                }
                DependencySpec::AnyOf { any_of } if any_of.is_empty() => {
                    return Err("any_of group is empty".to_string());
                }
                _ => {}
            }
        }
        if self.package.kind == PackageKind::Local && self.source.is_none() {
            return Err("local package has no [source]".to_string());
        }
        if self.package.kind == PackageKind::Library
            && self.detect.headers.is_empty()
            && self.detect.library.is_none()
        {
            return Err("library package needs detect.headers or detect.library".to_string());
        }
        Ok(())
    }

    /// Dependency entries in their resolved form.
    pub fn dependency_entries(&self) -> Vec<Dependency> {
        self.dependencies.iter().cloned().map(Into::into).collect()
    }
}

/// Load every `*.toml` manifest in `dir`, sorted by file name.
///
/// A missing directory yields no manifests.
///
/// # Errors
///
/// The first manifest that fails to load, or a read error on `dir` itself.
pub fn load_dir(dir: &Path) -> Result<Vec<PackageManifest>, ManifestError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ManifestError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "toml") && p.is_file())
        .collect();
    paths.sort();

    paths.iter().map(|p| PackageManifest::from_file(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEANT: &str = r#"
        [package]
        name = "Geant4"
        version = "9.5.p01"
        kind = "local"
        mode = "graphical"

        [[dependencies]]
        name = "clhep"

        [[dependencies]]
        any_of = ["curl", "wget"]

        [source]
        url = "https://example.org/geant4.9.5.p01.tar.gz"
        auth = "github"

        [build]
        script = "make install"
    "#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_local_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = PackageManifest::from_file(&write(dir.path(), "geant4.toml", GEANT)).unwrap();

        assert_eq!(manifest.package.name, "geant4");
        assert_eq!(manifest.package.mode, Some(InstallMode::Graphical));
        assert_eq!(
            manifest.dependency_entries(),
            vec![Dependency::required("clhep"), Dependency::any_of(["curl", "wget"])]
        );
        let source = manifest.source.unwrap();
        assert_eq!(source.auth, Some(AuthKind::Github));
        assert_eq!(source.sha256, None);
        assert_eq!(manifest.build.script, "make install");
    }

    #[test]
    fn test_parse_command_manifest() {
        let manifest: PackageManifest = toml::from_str(
            r#"
            [package]
            name = "curl"
            kind = "command"
            help = "Install curl with your package manager."
            "#,
        )
        .unwrap();
        manifest.validate().unwrap();
        assert!(manifest.dependencies.is_empty());
        assert_eq!(manifest.detect.command, None);
        assert_eq!(manifest.package.version, "");
    }

    #[test]
    fn test_invalid_manifests_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            ("nosource.toml", "[package]\nname = \"root\"\nkind = \"local\"\n"),
            ("blank.toml", "[package]\nname = \"  \"\nkind = \"command\"\n"),
            (
                "group.toml",
                "[package]\nname = \"a\"\nkind = \"command\"\n[[dependencies]]\nany_of = []\n",
            ),
            ("lib.toml", "[package]\nname = \"xm\"\nkind = \"library\"\n"),
        ];
        for (file, content) in cases {
            let err = PackageManifest::from_file(&write(dir.path(), file, content)).unwrap_err();
            assert!(matches!(err, ManifestError::Invalid { .. }), "{file}: {err}");
            assert!(err.to_string().contains(file));
        }
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "broken.toml", "[package\n");
        let err = PackageManifest::from_file(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_load_dir_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.toml", "[package]\nname = \"b\"\nkind = \"command\"\n");
        write(dir.path(), "a.toml", "[package]\nname = \"a\"\nkind = \"command\"\n");
        write(dir.path(), "notes.txt", "not a manifest");

        let names: Vec<String> = load_dir(dir.path())
            .unwrap()
            .into_iter()
            .map(|m| m.package.name.to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        assert!(load_dir(&dir.path().join("missing")).unwrap().is_empty());
    }
}
