//! Logging setup for Perspectiva.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{PerspectivaError, Result};

/// Build the event filter.
///
/// `RUST_LOG` wins when set. Otherwise `level` is used as a filter
/// directive, so both `debug` and `info,perspectiva::ingest=trace` work.
/// Anything unparsable falls back to `info`.
fn build_filter(level: &str) -> EnvFilter {
    let level = match level.trim() {
        "warning" => "warn",
        other => other,
    };
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Open `path` for appending, creating its directory if needed.
fn open_log_file(path: &str) -> Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::options().create(true).append(true).open(path)?)
}

/// Install the global subscriber.
///
/// Events always go to stdout. With `config.file` set they are appended to
/// that file too and ANSI colours are turned off so the file stays plain.
/// If the file cannot be opened nothing is installed and the error is
/// returned, so the caller can retry with [`init_console_only`].
pub fn init(config: &LoggingConfig) -> Result<()> {
    let (writer, ansi) = match config.file.as_deref() {
        Some(path) => {
            let file = Arc::new(open_log_file(path)?);
            (BoxMakeWriter::new(std::io::stdout.and(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .try_init()
        .map_err(|e| PerspectivaError::Config(format!("failed to install logger: {e}")))
}

/// Install a stdout-only subscriber at `level`.
pub fn init_console_only(level: &str) {
    let config = LoggingConfig {
        level: level.to_string(),
        file: None,
    };
    if let Err(e) = init(&config) {
        eprintln!("{e}");
    }
}
