//! Error types for registry operations.
//!
//! Packages fail with [`SystemError`], a plain message/detail pair describing
//! what went wrong underneath (network, filesystem, build tool). The registry
//! reports it to the logger and converts it into a [`PackageError`] that
//! names the package, so callers never see the lower-level failure type.

use tarn_schema::{Activity, InstallMode, PackageName};
use thiserror::Error;

/// Failure raised by a package's own download/install/update/remove step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SystemError {
    /// One line summary.
    pub message: String,
    /// Longer diagnostic output (command stderr, HTTP status, paths).
    pub detail: String,
}

impl SystemError {
    /// Create an error with a summary and detail.
    pub fn new(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Wrap an IO error with a summary of what was being attempted.
    pub fn io(context: impl Into<String>, err: &std::io::Error) -> Self {
        Self::new(context, err.to_string())
    }
}

/// Failure of a registry operation. Every variant names the offending package.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    /// The name is not in the registry.
    #[error("package '{name}' doesn't exist")]
    NotFound {
        /// Requested name.
        name: PackageName,
    },

    /// A second package was registered under an existing name.
    #[error("package '{name}' is already registered")]
    DuplicatePackage {
        /// Colliding name.
        name: PackageName,
    },

    /// The package requires an install mode the system is not configured for.
    #[error(
        "package '{name}' install mode ({required}) is incompatible with the system ({})",
        describe_mode(.system)
    )]
    IncompatibleMode {
        /// Package name.
        name: PackageName,
        /// Mode declared by the package.
        required: InstallMode,
        /// Mode the system is configured for.
        system: Option<InstallMode>,
    },

    /// Install/update/remove requested on a detection-only package.
    #[error("package '{name}' cannot be managed by tarn. {help}")]
    NotInstallable {
        /// Package name.
        name: PackageName,
        /// Guidance on installing it by other means.
        help: String,
    },

    /// Non-forced removal of a package that is not installed.
    #[error("cannot remove '{name}', not installed")]
    NotInstalled {
        /// Package name.
        name: PackageName,
    },

    /// Non-forced removal blocked by an installed dependent.
    #[error("cannot remove '{name}' as {dependent} depends on it")]
    DependentsExist {
        /// Package whose removal was requested.
        name: PackageName,
        /// Installed package that depends on it.
        dependent: PackageName,
    },

    /// Resolution re-entered a package that was still being resolved.
    #[error("circular dependency detected involving package '{name}'")]
    CircularDependency {
        /// Package reached twice on the same resolution path.
        name: PackageName,
    },

    /// A package step failed; the underlying cause went to the logger.
    #[error("{action} '{name}' failed")]
    OperationFailed {
        /// Package name.
        name: PackageName,
        /// Step that failed.
        action: Activity,
    },
}

fn describe_mode(mode: &Option<InstallMode>) -> &'static str {
    match mode {
        Some(mode) => mode.as_str(),
        None => "default",
    }
}
