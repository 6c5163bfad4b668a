pub mod config;
pub mod error;
pub mod io;
pub mod package;
pub mod packages;
pub mod registry;
pub mod system;

pub mod logger;

pub use config::*;
pub use error::{PackageError, SystemError};
pub use logger::{Logger, NullLogger, TracingLogger};
pub use package::{Authenticatable, Credentials, DependencyPaths, FromSystem, Installable, Package};
pub use registry::{PackageStatus, Registry};
pub use system::System;

/// User Agent string for downloads
pub const USER_AGENT: &str = concat!("tarn/", env!("CARGO_PKG_VERSION"));
