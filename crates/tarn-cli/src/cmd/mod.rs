//! Subcommand implementations.
//!
//! Every command runs against a [`Session`]: the registry populated from the
//! manifests, wired to the right logger, for the configured directories.

pub mod deps;
pub mod install;
pub mod list;
pub mod query;
pub mod remove;
pub mod update;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tarn_core::packages::{self, Compiler};
use tarn_core::{Config, Logger, Registry, System, TracingLogger};
use tarn_schema::{InstallMode, PackageName};

use crate::Cli;
use crate::settings::{ModeLock, Settings};
use crate::ui::{TerminalLogger, UiActor};

/// Package installed when none is named.
pub const DEFAULT_PACKAGE: &str = "rat-dev";
/// Default package for grid installs.
pub const DEFAULT_GRID_PACKAGE: &str = "rat-3";

/// A registry ready for one command, plus the UI rendering its events.
#[derive(Debug)]
pub struct Session {
    pub registry: Registry,
    // Dropped after the registry so every event is rendered before shutdown.
    ui: Option<UiActor>,
}

impl Session {
    /// Resolve directories, check the install mode and register every package.
    pub fn open(cli: &Cli) -> Result<Self> {
        let settings_path = tarn_core::settings_path();
        let mut settings = Settings::load(&settings_path)?;
        settings.merge(cli.cache.as_deref(), cli.install.as_deref());
        settings.save(&settings_path)?;

        let defaults = Config::default();
        let config = Config::new(
            settings.cache.unwrap_or(defaults.cache_path),
            settings.install.unwrap_or(defaults.install_path),
        )
        .with_mode(cli.mode());
        config
            .ensure_dirs()
            .context("Failed to create cache and install directories")?;
        ModeLock::ensure(&config.install_path, config.mode)?;

        let (logger, ui): (Arc<dyn Logger>, Option<UiActor>) = if cli.verbose {
            (Arc::new(TracingLogger), None)
        } else {
            let ui = UiActor::spawn();
            (Arc::new(TerminalLogger::new(ui.sender())), Some(ui))
        };

        let mut registry = Registry::new(System::new(config), logger);
        registry.register_type::<Compiler>()?;

        let packages_dir = cli.packages.clone().unwrap_or_else(tarn_core::packages_dir);
        let manifests = tarn_schema::load_dir(&packages_dir)
            .with_context(|| format!("Failed to load packages from {}", packages_dir.display()))?;
        tracing::debug!(count = manifests.len(), dir = %packages_dir.display(), "manifests loaded");
        for manifest in manifests {
            registry.register_with(|system| packages::from_manifest(manifest, system))?;
        }

        if let Some(credentials) = cli.credentials() {
            registry.authenticate(&credentials);
        }

        let system = registry.system();
        registry.logger().info(&format!(
            "Caching to {}, installing to {}",
            system.cache_path().display(),
            system.install_path().display()
        ));

        Ok(Self { registry, ui })
    }

    /// The named package, or the default for the configured install mode.
    pub fn package_or_default(&self, package: Option<&str>) -> PackageName {
        match package {
            Some(name) => PackageName::new(name),
            None => default_package(self.registry.system().install_mode()),
        }
    }

    pub fn info(&self, msg: &str) {
        self.registry.logger().info(msg);
    }

    /// Point the user at the run log after a failed command.
    pub fn report_failure(&self, log_path: &Path) {
        self.info(&format!(
            "tarn has failed, consult the messages above or {}",
            log_path.display()
        ));
    }

    /// Wait for the UI to catch up before printing directly to stdout.
    pub fn sync(&self) {
        if let Some(ui) = &self.ui {
            ui.sync();
        }
    }
}

/// Default package for `mode`.
pub fn default_package(mode: Option<InstallMode>) -> PackageName {
    match mode {
        Some(InstallMode::Grid) => PackageName::new(DEFAULT_GRID_PACKAGE),
        _ => PackageName::new(DEFAULT_PACKAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_package() {
        assert_eq!(default_package(None), "rat-dev");
        assert_eq!(default_package(Some(InstallMode::Graphical)), "rat-dev");
        assert_eq!(default_package(Some(InstallMode::Grid)), "rat-3");
    }
}
