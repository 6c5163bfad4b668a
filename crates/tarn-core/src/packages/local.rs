//! Packages tarn downloads, builds and installs itself.
//!
//! Layout on disk:
//! - `<cache>/<name>-<archive file name>`: the downloaded source archive
//! - `<install>/<name>/`: extracted source, built in place
//! - `<install>/<name>/.installed`: marker holding the installed version

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use reqwest::blocking::Client;
use tarn_schema::manifest::{PackageManifest, SourceSpec};
use tarn_schema::{Dependency, InstallMode, PackageKind, PackageName};

use crate::config::{Config, filename_from_url};
use crate::error::SystemError;
use crate::io::download::DownloadRequest;
use crate::io::extract::{extract_auto, strip_components};
use crate::package::{Authenticatable, Credentials, DependencyPaths, Installable, Package};
use crate::system::System;

const MARKER: &str = ".installed";

/// A package built from a source archive with a shell script.
#[derive(Debug)]
pub struct LocalPackage {
    name: PackageName,
    version: String,
    help: String,
    mode: Option<InstallMode>,
    dependencies: Vec<Dependency>,
    source: Option<SourceSpec>,
    script: String,
    config: Config,
    install_dir: PathBuf,
    downloaded: bool,
    installed_version: Option<String>,
    dependency_paths: DependencyPaths,
    credentials: Option<Credentials>,
}

impl LocalPackage {
    /// Create the package described by `manifest` on `system`.
    pub fn new(manifest: PackageManifest, system: &System) -> Self {
        let dependencies = manifest.dependency_entries();
        let config = system.config().clone();
        let name = manifest.package.name;
        let install_dir = config.package_dir(&name);
        Self {
            version: manifest.package.version,
            help: manifest.package.help,
            mode: manifest.package.mode,
            dependencies,
            source: manifest.source,
            script: manifest.build.script,
            config,
            install_dir,
            downloaded: false,
            installed_version: None,
            dependency_paths: DependencyPaths::new(),
            credentials: None,
            name,
        }
    }

    /// Cache location of the source archive, if the package has a source.
    pub fn archive_path(&self) -> Option<PathBuf> {
        let source = self.source.as_ref()?;
        Some(self.config.archive_path(&self.name, filename_from_url(&source.url)))
    }

    fn marker_path(&self) -> PathBuf {
        self.install_dir.join(MARKER)
    }

    /// Fetch the source archive into the cache, replacing any cached copy.
    ///
    /// The download lands in a temporary file first, so a failed fetch leaves
    /// the previous archive untouched.
    fn refresh_archive(&mut self) -> Result<(), SystemError> {
        let (Some(source), Some(dest)) = (self.source.clone(), self.archive_path()) else {
            return Err(SystemError::new(
                format!("{} has no source to download", self.name),
                "the manifest has no [source] section",
            ));
        };
        self.fetch(&source, &dest)?;
        self.downloaded = true;
        Ok(())
    }

    fn fetch(&self, source: &SourceSpec, dest: &Path) -> Result<(), SystemError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|e| SystemError::new("Failed to create HTTP client", e.to_string()))?;

        tracing::info!(package = %self.name, url = %source.url, "downloading");
        DownloadRequest::new(&client, &source.url, dest)
            .with_hash(source.sha256.as_deref())
            .with_credentials(self.credentials.as_ref())
            .execute()
            .map(drop)
            .map_err(|e| SystemError::new(format!("Failed to download {}", self.name), e.to_string()))
    }

    fn unpack(&self, archive: &Path) -> Result<(), SystemError> {
        if self.install_dir.exists() {
            fs::remove_dir_all(&self.install_dir)
                .map_err(|e| SystemError::io(format!("Failed to clear {}", self.install_dir.display()), &e))?;
        }
        extract_auto(archive, &self.install_dir)
            .map_err(|e| SystemError::new(format!("Failed to extract {}", self.name), e.to_string()))?;
        strip_components(&self.install_dir)
            .map_err(|e| SystemError::io(format!("Failed to extract {}", self.name), &e))
    }

    fn build(&self) -> Result<(), SystemError> {
        if self.script.trim().is_empty() {
            return Ok(());
        }

        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c")
            .arg(&self.script)
            .current_dir(&self.install_dir)
            .env("PREFIX", &self.install_dir)
            .env("SOURCE_DIR", &self.install_dir)
            .env("JOBS", num_cpus::get().to_string());
        for (dep, path) in &self.dependency_paths {
            if let Some(path) = path {
                cmd.env(format!("DEP_{}", dep.env_suffix()), path);
            }
        }

        tracing::info!(package = %self.name, "building");
        let output = cmd
            .output()
            .map_err(|e| SystemError::io(format!("Failed to run build script for {}", self.name), &e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SystemError::new(
                format!("Build of {} failed ({})", self.name, output.status),
                stderr.trim(),
            ));
        }
        Ok(())
    }
}

impl Package for LocalPackage {
    fn name(&self) -> &PackageName {
        &self.name
    }

    fn kind(&self) -> PackageKind {
        PackageKind::Local
    }

    fn help_text(&self) -> &str {
        &self.help
    }

    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn check_state(&mut self) {
        self.downloaded = self.archive_path().is_some_and(|p| p.is_file());
        self.installed_version = fs::read_to_string(self.marker_path())
            .ok()
            .map(|v| v.trim().to_string());
    }

    fn is_installed(&self) -> bool {
        self.installed_version.is_some()
    }

    fn install_path(&self) -> Option<&Path> {
        self.is_installed().then_some(self.install_dir.as_path())
    }

    fn as_installable(&self) -> Option<&dyn Installable> {
        Some(self)
    }

    fn as_installable_mut(&mut self) -> Option<&mut dyn Installable> {
        Some(self)
    }

    fn as_authenticatable_mut(&mut self) -> Option<&mut dyn Authenticatable> {
        let accepts = self.source.as_ref().is_some_and(|s| s.auth.is_some());
        if accepts { Some(self) } else { None }
    }
}

impl Installable for LocalPackage {
    fn is_downloaded(&self) -> bool {
        self.downloaded
    }

    fn is_updated(&self) -> bool {
        self.installed_version.as_deref() == Some(self.version.as_str())
    }

    fn install_mode(&self) -> Option<InstallMode> {
        self.mode
    }

    fn set_dependency_paths(&mut self, paths: DependencyPaths) {
        self.dependency_paths = paths;
    }

    fn download(&mut self) -> Result<(), SystemError> {
        if self.downloaded {
            return Ok(());
        }
        self.refresh_archive()
    }

    fn install(&mut self) -> Result<(), SystemError> {
        let archive = self
            .archive_path()
            .filter(|p| p.is_file())
            .ok_or_else(|| SystemError::new(format!("{} is not downloaded", self.name), ""))?;

        self.unpack(&archive)?;
        self.build()?;

        fs::write(self.marker_path(), &self.version)
            .map_err(|e| SystemError::io(format!("Failed to mark {} installed", self.name), &e))?;
        self.installed_version = Some(self.version.clone());
        Ok(())
    }

    // The cached archive may hold an older release served from the same URL,
    // so always fetch. The old install stays in place until the fetch succeeds.
    fn update(&mut self) -> Result<(), SystemError> {
        self.refresh_archive()?;
        self.remove()?;
        self.install()
    }

    fn remove(&mut self) -> Result<(), SystemError> {
        if self.install_dir.exists() {
            fs::remove_dir_all(&self.install_dir)
                .map_err(|e| SystemError::io(format!("Failed to remove {}", self.name), &e))?;
        }
        self.installed_version = None;
        Ok(())
    }
}

impl Authenticatable for LocalPackage {
    fn authenticate(&mut self, credentials: &Credentials) {
        self.credentials = Some(credentials.clone());
    }
}
