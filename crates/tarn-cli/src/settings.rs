//! Persisted CLI defaults and the install-directory mode lock.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tarn_schema::InstallMode;

/// Name of the mode lock file inside an install directory.
pub const MODE_LOCK: &str = "tarn.toml";

/// Last used directories, stored in `~/.tarn/settings.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<PathBuf>,
}

impl Settings {
    /// Load settings, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Fold command line overrides in; an override replaces the stored value.
    pub fn merge(&mut self, cache: Option<&Path>, install: Option<&Path>) {
        if let Some(cache) = cache {
            self.cache = Some(cache.to_path_buf());
        }
        if let Some(install) = install {
            self.install = Some(install.to_path_buf());
        }
    }
}

/// Install mode an install directory was set up for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeLock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<InstallMode>,
}

impl ModeLock {
    /// Record `mode` for `install_dir`, or check it against the recorded one.
    ///
    /// The first run against a directory decides its mode; later runs must
    /// agree with it.
    pub fn ensure(install_dir: &Path, mode: Option<InstallMode>) -> Result<()> {
        let path = install_dir.join(MODE_LOCK);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let lock: Self = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                if lock.mode != mode {
                    bail!(
                        "Install mode for install directory does not match: {} was set up for {} mode, not {} mode",
                        install_dir.display(),
                        describe(lock.mode),
                        describe(mode)
                    );
                }
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::create_dir_all(install_dir)
                    .with_context(|| format!("Failed to create {}", install_dir.display()))?;
                let content = toml::to_string_pretty(&Self { mode }).context("Failed to serialize mode")?;
                fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

fn describe(mode: Option<InstallMode>) -> &'static str {
    mode.map_or("default", InstallMode::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/settings.toml");
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.merge(Some(Path::new("/data/cache")), None);
        settings.save(&path).unwrap();

        let mut loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.cache, Some(PathBuf::from("/data/cache")));
        assert_eq!(loaded.install, None);

        loaded.merge(None, Some(Path::new("/data/install")));
        assert_eq!(loaded.cache, Some(PathBuf::from("/data/cache")));
        assert_eq!(loaded.install, Some(PathBuf::from("/data/install")));
    }

    #[test]
    fn test_mode_lock() {
        let dir = tempdir().unwrap();
        let install = dir.path().join("install");

        ModeLock::ensure(&install, Some(InstallMode::Grid)).unwrap();
        assert!(install.join(MODE_LOCK).is_file());
        ModeLock::ensure(&install, Some(InstallMode::Grid)).unwrap();

        let err = ModeLock::ensure(&install, None).unwrap_err();
        assert!(err.to_string().contains("does not match"));
        let err = ModeLock::ensure(&install, Some(InstallMode::Graphical)).unwrap_err();
        assert!(err.to_string().contains("grid mode"));
    }

    #[test]
    fn test_default_mode_lock() {
        let dir = tempdir().unwrap();
        ModeLock::ensure(dir.path(), None).unwrap();
        ModeLock::ensure(dir.path(), None).unwrap();
        assert!(ModeLock::ensure(dir.path(), Some(InstallMode::Grid)).is_err());
    }
}
