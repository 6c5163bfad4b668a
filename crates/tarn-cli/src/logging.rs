//! Logging setup for the binary.
//!
//! Two layers share one subscriber:
//! - the console (stderr), filtered by `RUST_LOG` or the verbosity flag;
//! - the run log at `~/.tarn/tarn.log`, always at `info`, appended to on
//!   every run so a failed build can be inspected afterwards.
//!
//! Outside verbose mode the terminal UI already shows registry events, so
//! the console layer mutes the [`TracingLogger`](tarn_core::TracingLogger)
//! mirror of them while the run log keeps it.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const FILE_DIRECTIVES: &str = "info";

/// Console filter used when `RUST_LOG` is not set.
pub fn console_directives(verbose: bool) -> &'static str {
    if verbose { "info" } else { "warn,tarn_core::logger=off" }
}

/// Open the run log for appending, creating its directory.
pub fn open_run_log(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
///
/// The returned guard flushes the run log when dropped and must outlive
/// every command. `None` means the run log could not be opened; the console
/// layer is installed regardless.
pub fn init_logging(verbose: bool, log_path: &Path) -> Option<WorkerGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_directives(verbose)));
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file_layer, guard) = match open_run_log(log_path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(FILE_DIRECTIVES));
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("warning: cannot write run log {}: {e}", log_path.display());
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_console_directives() {
        assert_eq!(console_directives(true), "info");
        assert!(console_directives(false).contains("tarn_core::logger=off"));
    }

    #[test]
    fn test_run_log_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home/tarn.log");

        writeln!(open_run_log(&path).unwrap(), "first run").unwrap();
        writeln!(open_run_log(&path).unwrap(), "second run").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first run\nsecond run\n");
    }
}
