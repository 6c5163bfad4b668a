//! Installer configuration and well-known paths.

use std::io;
use std::path::PathBuf;

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use tarn_schema::InstallMode;

/// Returns the tarn home directory, or None if the user's home cannot be resolved.
///
/// `TARN_HOME` overrides the default of `~/.tarn`.
pub fn try_tarn_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("TARN_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".tarn"))
}

/// Returns the tarn home directory, falling back to `./.tarn` when no home
/// directory can be determined.
pub fn tarn_home() -> PathBuf {
    try_tarn_home().unwrap_or_else(|| PathBuf::from(".tarn"))
}

/// Persisted CLI defaults: ~/.tarn/settings.toml
pub fn settings_path() -> PathBuf {
    tarn_home().join("settings.toml")
}

/// Plain-text log of every run: ~/.tarn/tarn.log
pub fn log_path() -> PathBuf {
    tarn_home().join("tarn.log")
}

/// Package manifests: ~/.tarn/packages
pub fn packages_dir() -> PathBuf {
    tarn_home().join("packages")
}

/// Configuration threaded into the [`System`](crate::System) and from there
/// into every package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where downloaded archives are kept.
    pub cache_path: PathBuf,
    /// Root under which packages are installed.
    pub install_path: PathBuf,
    /// Install mode the system is configured for. `None` is the default
    /// (non-graphical, non-grid) install.
    #[serde(default)]
    pub mode: Option<InstallMode>,
}

impl Config {
    /// Configuration with explicit cache and install roots and no mode.
    pub fn new(cache_path: impl Into<PathBuf>, install_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            install_path: install_path.into(),
            mode: None,
        }
    }

    /// Set the install mode.
    pub fn with_mode(mut self, mode: Option<InstallMode>) -> Self {
        self.mode = mode;
        self
    }

    /// Create the cache and install directories if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if either directory cannot be created.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.cache_path)?;
        std::fs::create_dir_all(&self.install_path)
    }

    /// Cache path for an archive belonging to `package`.
    pub fn archive_path(&self, package: &str, filename: &str) -> PathBuf {
        self.cache_path.join(format!("{package}-{filename}"))
    }

    /// Install directory for `package`.
    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.install_path.join(package)
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = tarn_home();
        Self::new(home.join("cache"), home.join("install"))
    }
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.split('/').next_back().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://example.com/path/clhep-2.1.tgz"),
            "clhep-2.1.tgz"
        );
        assert_eq!(
            filename_from_url("https://example.com/a/root.tar.gz?raw=true"),
            "root.tar.gz"
        );
        assert_eq!(filename_from_url(""), "");
    }

    #[test]
    fn test_config_paths() {
        let config = Config::new("/tmp/cache", "/tmp/install").with_mode(Some(InstallMode::Grid));
        assert_eq!(
            config.archive_path("root", "root.tar.gz"),
            PathBuf::from("/tmp/cache/root-root.tar.gz")
        );
        assert_eq!(config.package_dir("root"), PathBuf::from("/tmp/install/root"));
        assert_eq!(config.mode, Some(InstallMode::Grid));
    }

    #[test]
    fn test_ensure_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::new(tmp.path().join("c"), tmp.path().join("i"));
        config.ensure_dirs().unwrap();
        assert!(config.cache_path.is_dir());
        assert!(config.install_path.is_dir());
    }
}
