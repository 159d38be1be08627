//! File logging.
//!
//! The TUI owns the terminal, so every command writes its logs to
//! `<home>/logs/otpgate.log` (rotated daily) instead of stderr.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive (e.g. `otpgate_core=debug`).
pub const LOG_ENV: &str = "OTPGATE_LOG";

const LOG_FILE_PREFIX: &str = "otpgate.log";
const FALLBACK_LEVEL: &str = "info";

/// Builds the filter from `OTPGATE_LOG`, else `default_level`, else `info`.
pub fn build_filter(env_value: Option<&str>, default_level: &str) -> EnvFilter {
    [env_value, Some(default_level)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(FALLBACK_LEVEL))
}

/// Installs the global subscriber writing to a daily log file in `dir`.
///
/// Keep the returned guard alive until exit; dropping it flushes the writer.
///
/// # Errors
/// Returns an error if the directory can't be created or a subscriber is
/// already installed.
pub fn init_file_logging(dir: &Path, default_level: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(env_value.as_deref(), default_level);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_wins_over_default() {
        let filter = build_filter(Some("debug"), "warn");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_invalid_or_blank_directive_falls_through() {
        assert_eq!(build_filter(Some("   "), "warn").to_string(), "warn");
        assert_eq!(build_filter(Some("otpgate=loud"), "error").to_string(), "error");
        assert_eq!(build_filter(None, "otpgate=loud").to_string(), "info");
    }
}
