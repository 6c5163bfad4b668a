//! The package contract.
//!
//! Every package implements [`Package`]. Packages tarn can install also
//! implement [`Installable`], and packages whose downloads need credentials
//! implement [`Authenticatable`]. The registry reaches those capabilities
//! through the `as_*` accessors, never by inspecting concrete types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tarn_schema::{Dependency, InstallMode, PackageKind, PackageName};

use crate::error::SystemError;
use crate::system::System;

/// Install locations of resolved dependencies, keyed by package name.
///
/// Detection-only dependencies may have no install path.
pub type DependencyPaths = BTreeMap<PackageName, Option<PathBuf>>;

/// Behaviour shared by every package.
pub trait Package {
    /// Stable identifier, used as the registry key.
    fn name(&self) -> &PackageName;

    /// Installable or detection-only, and how it is detected.
    fn kind(&self) -> PackageKind;

    /// Guidance shown when tarn cannot perform an operation on this package.
    fn help_text(&self) -> &str;

    /// Declared dependencies, in order.
    fn dependencies(&self) -> &[Dependency];

    /// Probe the live system and refresh the cached state. Idempotent.
    fn check_state(&mut self);

    /// Whether the package is installed (as of the last [`check_state`](Self::check_state)).
    fn is_installed(&self) -> bool;

    /// Where the package is installed, once it is.
    fn install_path(&self) -> Option<&Path>;

    /// Install capability, if tarn can install this package.
    fn as_installable(&self) -> Option<&dyn Installable> {
        None
    }

    /// Mutable install capability.
    fn as_installable_mut(&mut self) -> Option<&mut dyn Installable> {
        None
    }

    /// Credential capability, if downloads of this package are authenticated.
    fn as_authenticatable_mut(&mut self) -> Option<&mut dyn Authenticatable> {
        None
    }
}

/// Packages that tarn downloads, installs, updates and removes itself.
pub trait Installable {
    /// Whether the source is present in the cache.
    fn is_downloaded(&self) -> bool;

    /// Whether the installed copy is current. Updating a current package is a no-op.
    fn is_updated(&self) -> bool;

    /// Install mode this package requires, if any.
    fn install_mode(&self) -> Option<InstallMode>;

    /// Inject resolved dependency locations. Called once per resolution
    /// episode, before `download`, `install` or `update`.
    fn set_dependency_paths(&mut self, paths: DependencyPaths);

    /// Fetch the package source.
    ///
    /// # Errors
    ///
    /// Network or filesystem failure.
    fn download(&mut self) -> Result<(), SystemError>;

    /// Build and install. On success the package is installed and has an install path.
    ///
    /// # Errors
    ///
    /// Build or filesystem failure.
    fn install(&mut self) -> Result<(), SystemError>;

    /// Bring the installed package up to date.
    ///
    /// # Errors
    ///
    /// Network, build or filesystem failure.
    fn update(&mut self) -> Result<(), SystemError>;

    /// Uninstall. On success the package is no longer installed.
    ///
    /// # Errors
    ///
    /// Filesystem failure.
    fn remove(&mut self) -> Result<(), SystemError>;
}

/// Packages whose downloads accept user credentials.
pub trait Authenticatable {
    /// Store credentials for later downloads. Validation is up to the package.
    fn authenticate(&mut self, credentials: &Credentials);
}

/// Package types constructible from the system alone.
pub trait FromSystem: Package + Sized + 'static {
    /// Create the package for `system`.
    fn from_system(system: &System) -> Self;
}

/// Username or token for authenticated downloads.
///
/// The CLI accepts one or the other; both are passed through unchanged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: Option<String>,
    /// Access token.
    pub token: Option<String>,
}

impl Credentials {
    /// Whether neither a username nor a token was supplied.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.token.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_token() {
        let credentials = Credentials {
            username: None,
            token: Some("ghp_secret".to_string()),
        };
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_credentials_is_empty() {
        assert!(Credentials::default().is_empty());
        let credentials = Credentials {
            username: Some("pgj".to_string()),
            token: None,
        };
        assert!(!credentials.is_empty());
    }
}
