//! tarn - a dependency-aware source package installer
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Installs a software stack from source into a private directory, resolving
//! each package's dependencies first and reusing whatever the system already
//! provides.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.tarn/
//! ├── settings.toml   # last used cache/install directories
//! ├── tarn.log        # plain-text log of every run
//! ├── packages/       # one manifest (*.toml) per package
//! ├── cache/          # downloaded source archives
//! └── install/        # one directory per installed package
//!     └── tarn.toml   # install mode the directory was created for
//! ```

pub mod cmd;
pub mod logging;
pub mod settings;
pub mod ui;

pub use tarn_core::{Credentials, PackageError, Registry};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tarn_schema::InstallMode;

#[derive(Debug, Parser)]
#[command(name = "tarn")]
#[command(author, version, about = "tarn - install a software stack and its dependencies from source")]
pub struct Cli {
    /// Directory for downloaded archives (remembered for later runs)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub cache: Option<PathBuf>,

    /// Directory to install into (remembered for later runs)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub install: Option<PathBuf>,

    /// Directory holding package manifests
    #[arg(long, global = true, env = "TARN_PACKAGES", value_name = "DIR")]
    pub packages: Option<PathBuf>,

    /// Install for a desktop with graphical viewers
    #[arg(short, long, global = true, conflicts_with = "grid")]
    pub graphical: bool,

    /// Install for a headless grid node
    #[arg(short = 'x', long, global = true)]
    pub grid: bool,

    /// Username for authenticated downloads
    #[arg(short, long, global = true, conflicts_with = "token")]
    pub username: Option<String>,

    /// Access token for authenticated downloads
    #[arg(short, long, global = true, env = "TARN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Print a plain event log instead of the progress view
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Install mode selected on the command line.
    pub fn mode(&self) -> Option<InstallMode> {
        if self.graphical {
            Some(InstallMode::Graphical)
        } else if self.grid {
            Some(InstallMode::Grid)
        } else {
            None
        }
    }

    /// Credentials given on the command line, if any.
    pub fn credentials(&self) -> Option<Credentials> {
        let credentials = Credentials {
            username: self.username.clone(),
            token: self.token.clone(),
        };
        (!credentials.is_empty()).then_some(credentials)
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install a package and everything it depends on
    Install {
        /// Package name (defaults to rat-dev, or rat-3 with --grid)
        package: Option<String>,
        /// Install every known package
        #[arg(long, short = 'a', conflicts_with = "package")]
        all: bool,
    },
    /// Install only the dependencies of a package
    Deps {
        /// Package name (defaults to rat-dev, or rat-3 with --grid)
        package: Option<String>,
    },
    /// Update a package and re-install whatever depends on it
    Update {
        /// Package name (defaults to rat-dev, or rat-3 with --grid)
        package: Option<String>,
        /// Update every installed package
        #[arg(long, short = 'a', conflicts_with = "package")]
        all: bool,
    },
    /// Remove a package
    Remove {
        /// Package name (defaults to rat-dev, or rat-3 with --grid)
        package: Option<String>,
        /// Remove even if not installed or other packages depend on it
        #[arg(long, short = 'f')]
        force: bool,
        /// Delete the whole install directory
        #[arg(long, short = 'a', conflicts_with = "package")]
        all: bool,
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Report whether a package is installed
    Query {
        /// Package name (defaults to rat-dev, or rat-3 with --grid)
        package: Option<String>,
        /// Query every known package
        #[arg(long, short = 'a', conflicts_with = "package")]
        all: bool,
    },
    /// List known packages and their state
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mode_flags() {
        let cli = Cli::parse_from(["tarn", "-x", "install"]);
        assert_eq!(cli.mode(), Some(InstallMode::Grid));
        let cli = Cli::parse_from(["tarn", "install", "--graphical", "geant4"]);
        assert_eq!(cli.mode(), Some(InstallMode::Graphical));
        assert!(Cli::try_parse_from(["tarn", "-g", "-x", "install"]).is_err());
    }

    #[test]
    fn test_credentials_flags() {
        let cli = Cli::parse_from(["tarn", "-u", "pgj", "query"]);
        assert_eq!(cli.credentials().unwrap().username.as_deref(), Some("pgj"));
        assert!(Cli::try_parse_from(["tarn", "-u", "pgj", "-t", "abc", "query"]).is_err());
    }

    #[test]
    fn test_all_conflicts_with_package() {
        assert!(Cli::try_parse_from(["tarn", "install", "--all", "root"]).is_err());
        let cli = Cli::parse_from(["tarn", "remove", "--all", "--yes"]);
        assert!(matches!(
            cli.command,
            Commands::Remove { all: true, yes: true, force: false, package: None }
        ));
    }
}
