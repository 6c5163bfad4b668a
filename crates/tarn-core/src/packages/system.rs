//! Detection-only packages: things the system provides and tarn only looks for.

use std::path::{Path, PathBuf};

use tarn_schema::manifest::{DetectSpec, PackageManifest};
use tarn_schema::{Dependency, PackageKind, PackageName};

use crate::package::{FromSystem, Package};
use crate::system::System;

/// A library found by test-compiling its headers and linking it.
#[derive(Debug)]
pub struct SystemLibrary {
    name: PackageName,
    help: String,
    dependencies: Vec<Dependency>,
    detect: DetectSpec,
    system: System,
    installed: bool,
}

impl SystemLibrary {
    pub fn new(manifest: PackageManifest, system: &System) -> Self {
        Self {
            dependencies: manifest.dependency_entries(),
            name: manifest.package.name,
            help: manifest.package.help,
            detect: manifest.detect,
            system: system.clone(),
            installed: false,
        }
    }
}

impl Package for SystemLibrary {
    fn name(&self) -> &PackageName {
        &self.name
    }

    fn kind(&self) -> PackageKind {
        PackageKind::Library
    }

    fn help_text(&self) -> &str {
        &self.help
    }

    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn check_state(&mut self) {
        let detect = &self.detect;
        self.installed = match &detect.library {
            Some(library) => self.system.test_library(library, &detect.headers, &detect.flags),
            None => self.system.test_compile(&detect.headers, &detect.flags),
        };
        tracing::debug!(package = %self.name, installed = self.installed, "library probe");
    }

    fn is_installed(&self) -> bool {
        self.installed
    }

    // Libraries live wherever the toolchain finds them.
    fn install_path(&self) -> Option<&Path> {
        None
    }
}

/// An executable found on `PATH`. Its install path is the directory holding it.
#[derive(Debug)]
pub struct SystemCommand {
    name: PackageName,
    help: String,
    dependencies: Vec<Dependency>,
    command: String,
    system: System,
    location: Option<PathBuf>,
}

impl SystemCommand {
    pub fn new(manifest: PackageManifest, system: &System) -> Self {
        let command = manifest
            .detect
            .command
            .unwrap_or_else(|| manifest.package.name.to_string());
        Self::with_command(
            manifest.package.name,
            command,
            manifest.package.help,
            manifest.dependencies.into_iter().map(Into::into).collect(),
            system,
        )
    }

    pub fn with_command(
        name: PackageName,
        command: impl Into<String>,
        help: impl Into<String>,
        dependencies: Vec<Dependency>,
        system: &System,
    ) -> Self {
        Self {
            name,
            help: help.into(),
            dependencies,
            command: command.into(),
            system: system.clone(),
            location: None,
        }
    }

    /// The command looked up on `PATH`.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Package for SystemCommand {
    fn name(&self) -> &PackageName {
        &self.name
    }

    fn kind(&self) -> PackageKind {
        PackageKind::Command
    }

    fn help_text(&self) -> &str {
        &self.help
    }

    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn check_state(&mut self) {
        self.location = self
            .system
            .find_command(&self.command)
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
    }

    fn is_installed(&self) -> bool {
        self.location.is_some()
    }

    fn install_path(&self) -> Option<&Path> {
        self.location.as_deref()
    }
}

/// The C compiler the system probes with, registered as `compiler`.
#[derive(Debug)]
pub struct Compiler(SystemCommand);

impl FromSystem for Compiler {
    fn from_system(system: &System) -> Self {
        let program = system
            .compiler()
            .split_whitespace()
            .next()
            .unwrap_or("cc")
            .to_string();
        Self(SystemCommand::with_command(
            PackageName::new("compiler"),
            program,
            "Install a C compiler (gcc or clang) with your system package manager, or point CC at one.",
            Vec::new(),
            system,
        ))
    }
}

impl Package for Compiler {
    fn name(&self) -> &PackageName {
        self.0.name()
    }

    fn kind(&self) -> PackageKind {
        self.0.kind()
    }

    fn help_text(&self) -> &str {
        self.0.help_text()
    }

    fn dependencies(&self) -> &[Dependency] {
        self.0.dependencies()
    }

    fn check_state(&mut self) {
        self.0.check_state();
    }

    fn is_installed(&self) -> bool {
        self.0.is_installed()
    }

    fn install_path(&self) -> Option<&Path> {
        self.0.install_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn system() -> System {
        System::new(Config::new("/tmp/tarn-cache", "/tmp/tarn-install"))
    }

    fn manifest(toml_src: &str) -> PackageManifest {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn test_command_found_on_path() {
        let mut sh = SystemCommand::new(
            manifest("[package]\nname = \"sh\"\nkind = \"command\"\n"),
            &system(),
        );
        assert!(!sh.is_installed());
        sh.check_state();
        assert!(sh.is_installed());
        let dir = sh.install_path().unwrap();
        assert!(dir.join("sh").exists());
        assert!(sh.as_installable().is_none());
    }

    #[test]
    fn test_command_name_override() {
        let mut missing = SystemCommand::new(
            manifest(
                "[package]\nname = \"fetcher\"\nkind = \"command\"\nhelp = \"apt install it\"\n[detect]\ncommand = \"tarn-no-such-tool\"\n",
            ),
            &system(),
        );
        missing.check_state();
        assert_eq!(missing.command(), "tarn-no-such-tool");
        assert!(!missing.is_installed());
        assert_eq!(missing.install_path(), None);
        assert_eq!(missing.help_text(), "apt install it");
    }

    #[test]
    fn test_library_without_compiler_is_missing() {
        let system = system().with_compiler("tarn-no-such-compiler");
        let mut xm = SystemLibrary::new(
            manifest(
                "[package]\nname = \"xm\"\nkind = \"library\"\n[detect]\nheaders = [\"Xm/Xm.h\"]\nlibrary = \"Xm\"\n",
            ),
            &system,
        );
        xm.check_state();
        assert!(!xm.is_installed());
        assert_eq!(xm.kind(), PackageKind::Library);
        assert!(xm.as_installable().is_none());
    }

    #[test]
    fn test_compiler_from_system() {
        let system = system().with_compiler("sh -e");
        let mut compiler = Compiler::from_system(&system);
        compiler.check_state();
        assert_eq!(compiler.name(), "compiler");
        assert!(compiler.is_installed());
    }
}
