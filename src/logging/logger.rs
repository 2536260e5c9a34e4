// file: src/logging/logger.rs
// version: 2.0.0
// guid: j0k1l2m3-b4c5-6789-0123-456789abcdef

//! Logger initialization and configuration

use crate::error::InstallerError;
use crate::settings::{LogFormat, LoggingSettings};
use crate::Result;
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Resolved logging options
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub level: String,
    pub format: LogFormat,
    pub directory: Option<PathBuf>,
}

impl LogOptions {
    /// Combine settings with the `--verbose`/`--quiet` flags, which win
    pub fn new(settings: &LoggingSettings, verbose: bool, quiet: bool) -> Self {
        let level = if quiet {
            "error".to_string()
        } else if verbose {
            "debug".to_string()
        } else {
            settings.level.clone()
        };
        Self {
            level,
            format: settings.format,
            directory: settings.directory.clone(),
        }
    }
}

/// File name of a log started at `at`
pub fn log_file_name(at: DateTime<Utc>) -> String {
    format!("hci-installer-{}.log", at.format("%Y%m%dT%H%M%SZ"))
}

/// Initialize the logging system. Output goes to stderr, and additionally to a
/// timestamped file when a log directory is configured.
pub fn init_logger(options: &LogOptions) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_new(&options.level)
        .map_err(|e| InstallerError::config(format!("Invalid log level {:?}: {}", options.level, e)))?;

    let stderr = match options.format {
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let (file_layer, log_path) = match &options.directory {
        Some(dir) => {
            let path = open_log_file(dir)?;
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .boxed();
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .try_init()
        .map_err(|e| InstallerError::config(format!("Failed to initialize logger: {}", e)))?;

    Ok(log_path)
}

fn open_log_file(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| {
        InstallerError::config(format!("Failed to create log directory {}: {}", dir.display(), e))
    })?;
    Ok(dir.join(log_file_name(Utc::now())))
}

/// Run `f` inside a named operation span
pub fn with_operation_span<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let span = tracing::info_span!("operation", name = operation);
    let _enter = span.enter();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_flags_override_level() {
        let settings = LoggingSettings {
            level: "warn".to_string(),
            ..Default::default()
        };
        assert_eq!(LogOptions::new(&settings, false, false).level, "warn");
        assert_eq!(LogOptions::new(&settings, true, false).level, "debug");
        assert_eq!(LogOptions::new(&settings, true, true).level, "error");
    }

    #[test]
    fn test_log_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(log_file_name(at), "hci-installer-20240301T123005Z.log");
    }

    #[test]
    fn test_invalid_level() {
        let options = LogOptions {
            level: "hci_installer=bogus".to_string(),
            format: LogFormat::Compact,
            directory: None,
        };
        assert!(init_logger(&options).is_err());
    }

    #[test]
    fn test_init_logger_once() {
        let dir = tempfile::tempdir().unwrap();
        let options = LogOptions {
            level: "info".to_string(),
            format: LogFormat::Json,
            directory: Some(dir.path().join("logs")),
        };
        // a subscriber may already be installed by another test
        if let Ok(Some(path)) = init_logger(&options) {
            assert!(path.starts_with(dir.path()));
            assert!(path.exists());
        }
    }

    #[test]
    fn test_with_operation_span() {
        assert_eq!(with_operation_span("math", || 2 + 2), 4);
    }
}
