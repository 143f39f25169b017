//! File logging. The terminal belongs to the UI, so nothing is written to stdout.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Level used when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber appending to `log_file_path`.
///
/// Returns false if the file can't be opened; the app then runs without logging.
pub fn init_global(log_file_path: &Path) -> bool {
    let Some(log_file) = open_log_file(log_file_path) else {
        return false;
    };
    build_subscriber(log_file).try_init().is_ok()
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Subscriber writing plain-text records to `log_file`, filtered by `RUST_LOG`.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let fmt_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
