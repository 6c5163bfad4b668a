//! Core value types shared by every tarn crate: package names, dependency
//! entries, install modes and package kinds.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A normalized package name.
///
/// Names are case-insensitive: they are lowercased on construction and on
/// deserialization, so `Xm` and `xm` refer to the same registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name formatted for use as an environment variable suffix
    /// (`geant4-data` becomes `GEANT4_DATA`).
    pub fn env_suffix(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for PackageName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// One entry in a package's dependency list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// A single package that must be installed.
    Required(PackageName),
    /// Alternatives: the entry is satisfied if any member is installed.
    /// When none is, the first member is installed as the default choice.
    AnyOf(Vec<PackageName>),
}

impl Dependency {
    /// A mandatory dependency on `name`.
    pub fn required(name: impl Into<PackageName>) -> Self {
        Self::Required(name.into())
    }

    /// An optional dependency group. The first name is the default.
    pub fn any_of<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<PackageName>,
    {
        Self::AnyOf(names.into_iter().map(Into::into).collect())
    }

    /// Every package name this entry refers to, in declared order.
    pub fn names(&self) -> &[PackageName] {
        match self {
            Self::Required(name) => std::slice::from_ref(name),
            Self::AnyOf(group) => group,
        }
    }

    /// Whether `name` appears in this entry, directly or as a group member.
    pub fn mentions(&self, name: &PackageName) -> bool {
        self.names().contains(name)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required(name) => write!(f, "{name}"),
            Self::AnyOf(group) => {
                let names: Vec<&str> = group.iter().map(PackageName::as_str).collect();
                write!(f, "[{}]", names.join(" | "))
            }
        }
    }
}

/// Environment a package may require the target system to be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Desktop install with X11 viewers available.
    Graphical,
    /// Headless grid-node install (no X11).
    Grid,
}

impl InstallMode {
    /// Lowercase identifier, as used in manifests and settings files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Graphical => "graphical",
            Self::Grid => "grid",
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown install mode.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown install mode '{0}' (expected 'graphical' or 'grid')")]
pub struct ParseModeError(pub String);

impl FromStr for InstallMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graphical" => Ok(Self::Graphical),
            "grid" => Ok(Self::Grid),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Long-running step the registry is currently performing on a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    /// Fetching the package source.
    Downloading,
    /// Building and installing.
    Installing,
    /// Bringing an installed package up to date.
    Updating,
    /// Uninstalling.
    Removing,
}

impl Activity {
    /// Human readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Downloading => "Downloading",
            Self::Installing => "Installing",
            Self::Updating => "Updating",
            Self::Removing => "Removing",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a package comes to be present on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Downloaded, built and installed by tarn.
    Local,
    /// A system library detected by test-compiling its headers.
    Library,
    /// A system command detected on `PATH`.
    Command,
}

impl PackageKind {
    /// Whether tarn can install packages of this kind itself.
    pub fn is_installable(self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Library => "library",
            Self::Command => "command",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_normalizes_case() {
        let name = PackageName::new("  Xm ");
        assert_eq!(name.as_str(), "xm");
        assert_eq!(name, "XM");
        assert_eq!(PackageName::from("ROOT"), PackageName::new("root"));
    }

    #[test]
    fn test_package_name_env_suffix() {
        assert_eq!(PackageName::new("geant4-data").env_suffix(), "GEANT4_DATA");
        assert_eq!(PackageName::new("rat.dev").env_suffix(), "RAT_DEV");
    }

    #[test]
    fn test_package_name_deserialize_normalizes() {
        #[derive(Deserialize)]
        struct Doc {
            name: PackageName,
        }
        let doc: Doc = toml::from_str(r#"name = "CLHEP""#).unwrap();
        assert_eq!(doc.name.as_str(), "clhep");
    }

    #[test]
    fn test_dependency_names_and_mentions() {
        let single = Dependency::required("clhep");
        assert_eq!(single.names(), &[PackageName::new("clhep")]);

        let group = Dependency::any_of(["curl", "wget"]);
        assert!(group.mentions(&PackageName::new("wget")));
        assert!(!group.mentions(&PackageName::new("root")));
        assert_eq!(group.names()[0], "curl");
    }

    #[test]
    fn test_dependency_display() {
        assert_eq!(Dependency::required("root").to_string(), "root");
        assert_eq!(
            Dependency::any_of(["curl", "wget"]).to_string(),
            "[curl | wget]"
        );
    }

    #[test]
    fn test_install_mode_parse() {
        assert_eq!("Graphical".parse(), Ok(InstallMode::Graphical));
        assert_eq!("grid".parse(), Ok(InstallMode::Grid));
        assert!("headless".parse::<InstallMode>().is_err());
    }

    #[test]
    fn test_activity_labels() {
        assert_eq!(Activity::Downloading.to_string(), "Downloading");
        assert_eq!(Activity::Removing.as_str(), "Removing");
    }

    #[test]
    fn test_package_kind_installable() {
        assert!(PackageKind::Local.is_installable());
        assert!(!PackageKind::Library.is_installable());
        assert!(!PackageKind::Command.is_installable());
    }
}
