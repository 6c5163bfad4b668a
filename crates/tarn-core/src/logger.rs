//! Logger trait for dependency injection
//!
//! The registry reports every lifecycle change through this trait without
//! being coupled to a terminal UI. Notifications are fire-and-forget: nothing
//! a logger does can influence control flow.

use tarn_schema::{Activity, PackageName};

pub trait Logger: Send + Sync {
    /// A package was added to the registry.
    fn package_registered(&self, name: &PackageName);

    /// A package's source is present in the cache.
    fn package_downloaded(&self, name: &PackageName);

    /// A package is installed (freshly, or detected as already present).
    fn package_installed(&self, name: &PackageName);

    /// A package was uninstalled.
    fn package_removed(&self, name: &PackageName);

    /// A package was brought up to date.
    fn package_updated(&self, name: &PackageName);

    /// The registry started a long-running step on a package.
    fn set_state(&self, activity: Activity, name: &PackageName);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Log the detail accompanying the previous error.
    fn detail(&self, msg: &str);
}

impl<T: Logger + ?Sized> Logger for std::sync::Arc<T> {
    fn package_registered(&self, name: &PackageName) {
        (**self).package_registered(name);
    }
    fn package_downloaded(&self, name: &PackageName) {
        (**self).package_downloaded(name);
    }
    fn package_installed(&self, name: &PackageName) {
        (**self).package_installed(name);
    }
    fn package_removed(&self, name: &PackageName) {
        (**self).package_removed(name);
    }
    fn package_updated(&self, name: &PackageName) {
        (**self).package_updated(name);
    }
    fn set_state(&self, activity: Activity, name: &PackageName) {
        (**self).set_state(activity, name);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn detail(&self, msg: &str) {
        (**self).detail(msg);
    }
}

/// A no-op logger for silent operations (e.g., scripting, testing).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn package_registered(&self, _: &PackageName) {}
    fn package_downloaded(&self, _: &PackageName) {}
    fn package_installed(&self, _: &PackageName) {}
    fn package_removed(&self, _: &PackageName) {}
    fn package_updated(&self, _: &PackageName) {}
    fn set_state(&self, _: Activity, _: &PackageName) {}
    fn info(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn detail(&self, _: &str) {}
}

/// Logger that forwards every notification to `tracing`.
///
/// Used for plain-text (verbose) runs where the subscriber installed by the
/// binary decides formatting and destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn package_registered(&self, name: &PackageName) {
        tracing::debug!(package = %name, "registered");
    }
    fn package_downloaded(&self, name: &PackageName) {
        tracing::info!(package = %name, "downloaded");
    }
    fn package_installed(&self, name: &PackageName) {
        tracing::info!(package = %name, "installed");
    }
    fn package_removed(&self, name: &PackageName) {
        tracing::info!(package = %name, "removed");
    }
    fn package_updated(&self, name: &PackageName) {
        tracing::info!(package = %name, "updated");
    }
    fn set_state(&self, activity: Activity, name: &PackageName) {
        tracing::info!(package = %name, "{activity}");
    }
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }
    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }
    fn detail(&self, msg: &str) {
        tracing::error!(detail = true, "{msg}");
    }
}
