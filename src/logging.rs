//! # Logging
//!
//! Sets up the `tracing` subscriber: human-readable output on stderr,
//! optionally mirrored to a daily-rotating file.

use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Log file prefix inside the log directory
const LOG_FILE_PREFIX: &str = "wlan-watchdog.log";

/// Build the filter from `RUST_LOG`, defaulting to `info`
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// When `log_dir` is given, the returned guard must be kept alive for the
/// lifetime of the process so buffered lines are flushed on exit.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            builder
                .with_writer(std::io::stderr.and(file_writer))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_prefix() {
        assert_eq!(LOG_FILE_PREFIX, "wlan-watchdog.log");
    }

    #[test]
    fn test_second_init_fails() {
        // The first call may lose the race to another test's subscriber,
        // but a second call in the same process can never succeed.
        let _ = init(None);
        assert!(init(None).is_err());
    }
}
