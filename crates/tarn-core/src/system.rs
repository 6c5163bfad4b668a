//! The target platform as seen by packages.
//!
//! A [`System`] carries the [`Config`] and answers platform questions:
//! which install mode is configured, where a command lives on `PATH`, and
//! whether a set of headers/libraries can be compiled against.
//! The registry only reads the install mode; the probes exist for packages.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tarn_schema::InstallMode;

use crate::config::Config;

/// The target system. Cheap to clone; packages keep their own copy.
#[derive(Debug, Clone)]
pub struct System {
    config: Config,
    compiler: String,
}

impl System {
    /// Build a system for the current host.
    ///
    /// The C compiler used for probes comes from `CC`, defaulting to `cc`.
    pub fn new(config: Config) -> Self {
        let compiler = std::env::var("CC").unwrap_or_else(|_| "cc".to_string());
        Self {
            config,
            compiler,
        }
    }

    /// Override the compiler used by [`test_compile`](Self::test_compile).
    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    /// C compiler used for probes.
    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// Configuration this system was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configured install mode.
    pub fn install_mode(&self) -> Option<InstallMode> {
        self.config.mode
    }

    /// Download cache root.
    pub fn cache_path(&self) -> &Path {
        &self.config.cache_path
    }

    /// Install root.
    pub fn install_path(&self) -> &Path {
        &self.config.install_path
    }

    /// Locate `command` on `PATH`.
    pub fn find_command(&self, command: &str) -> Option<PathBuf> {
        which::which(command).ok()
    }

    /// Try to compile and link a program including `headers`, passing
    /// `flags` to the compiler. Returns `false` if the compiler is missing.
    pub fn test_compile(&self, headers: &[String], flags: &[String]) -> bool {
        let Ok(dir) = tempfile::tempdir() else {
            return false;
        };
        let mut program = String::new();
        for header in headers {
            let _ = writeln!(program, "#include <{header}>");
        }
        program.push_str("int main(void) { return 0; }\n");

        let source = dir.path().join("probe.c");
        if std::fs::write(&source, program).is_err() {
            return false;
        }

        let status = Command::new(&self.compiler)
            .arg(&source)
            .arg("-o")
            .arg(dir.path().join("probe"))
            .args(flags)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!(compiler = %self.compiler, "test compile could not run: {e}");
                false
            }
        }
    }

    /// Whether `library` can be linked with `headers` included, on top of
    /// any extra compiler `flags`.
    pub fn test_library(&self, library: &str, headers: &[String], flags: &[String]) -> bool {
        let mut flags = flags.to_vec();
        flags.push(format!("-l{library}"));
        self.test_compile(headers, &flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> System {
        System::new(Config::new("/tmp/tarn-cache", "/tmp/tarn-install"))
    }

    #[test]
    fn test_install_mode_comes_from_config() {
        let config = Config::new("/c", "/i").with_mode(Some(InstallMode::Graphical));
        assert_eq!(System::new(config).install_mode(), Some(InstallMode::Graphical));
        assert_eq!(system().install_mode(), None);
    }

    #[test]
    fn test_find_command() {
        let system = system();
        assert!(system.find_command("sh").is_some());
        assert!(system.find_command("tarn-definitely-not-a-command").is_none());
    }

    #[test]
    fn test_missing_compiler_fails_probe() {
        let system = system().with_compiler("tarn-no-such-compiler");
        assert!(!system.test_compile(&["stdio.h".to_string()], &[]));
        assert!(!system.test_library("m", &["math.h".to_string()], &[]));
    }

    #[test]
    fn test_library_probe_passes_flags() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let record = tmp.path().join("args");
        let cc = tmp.path().join("fake-cc");
        std::fs::write(&cc, format!("#!/bin/sh\necho \"$@\" > {}\n", record.display())).unwrap();
        std::fs::set_permissions(&cc, std::fs::Permissions::from_mode(0o755)).unwrap();

        let system = system().with_compiler(cc.to_string_lossy());
        assert!(system.test_library("Xm", &["Xm/Xm.h".to_string()], &["-I/sw/include".to_string()]));

        let args = std::fs::read_to_string(&record).unwrap();
        assert!(args.trim_end().ends_with("-I/sw/include -lXm"));
    }
}
