//! Log file setup
//!
//! Logs go to one file per UTC day, `{log_dir}/mail2news.YYYY-MM-DD.log`.
//! The level comes from the configuration unless `RUST_LOG` is set.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::GatewayError;

/// Log file name prefix
pub const LOG_PREFIX: &str = "mail2news";

/// Log file name suffix
pub const LOG_SUFFIX: &str = "log";

/// Map a configured level name onto a filter directive
///
/// Unknown names fall back to `info`.
///
/// # Examples
///
/// ```
/// use mail2news::logging::level_directive;
///
/// assert_eq!(level_directive("DEBUG"), "debug");
/// assert_eq!(level_directive("warning"), "warn");
/// assert_eq!(level_directive("chatty"), "info");
/// ```
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    }
}

/// Install the global subscriber writing to the daily log file
///
/// The returned guard flushes buffered lines when dropped and must be held
/// until the process exits.
pub fn init(log_dir: &Path, level: &str) -> Result<WorkerGuard, GatewayError> {
    fs::create_dir_all(log_dir).map_err(|e| {
        GatewayError::Logging(format!(
            "Unable to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .build(log_dir)
        .map_err(|e| GatewayError::Logging(format!("Unable to initialize logger: {}", e)))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_directive(level)))
        .map_err(|e| GatewayError::Logging(e.to_string()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| GatewayError::Logging(e.to_string()))?;

    Ok(guard)
}

/// Install a stderr subscriber for the maintenance subcommands
pub fn init_stderr(level: &str) -> Result<(), GatewayError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_directive(level)))
        .map_err(|e| GatewayError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| GatewayError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("error"), "error");
        assert_eq!(level_directive(" Warn "), "warn");
        assert_eq!(level_directive("info"), "info");
        assert_eq!(level_directive("notice"), "info");
        assert_eq!(level_directive(""), "info");
    }

    #[test]
    fn test_init_rejects_unusable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, "").unwrap();
        let result = init(&file, "info");
        assert!(matches!(result, Err(GatewayError::Logging(_))));
    }
}
