use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub to_stderr: bool,
    /// Directory for the rolling log file. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            to_stderr: true,
            log_dir: None,
        }
    }
}

/// `~/.jscope/logs`, falling back to the working directory when there is no home.
pub fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jscope/logs")
}

/// Installs the global subscriber. The returned guard flushes the file writer
/// on drop and must be held for the lifetime of the process.
pub fn init_logging(component: &str, options: &LoggingOptions) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &options.log_dir {
        Some(log_dir) => {
            let _ = std::fs::create_dir_all(log_dir);
            // Files are named like tree.log.2024-01-21
            let file_appender = tracing_appender::rolling::daily(log_dir, component);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = options.to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    // A subscriber may already be installed when called twice from tests.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested/logs");
        let options = LoggingOptions {
            to_stderr: false,
            log_dir: Some(log_dir.clone()),
        };
        let guard = init_logging("test", &options);
        assert!(guard.is_some());
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_default_log_dir_is_under_jscope() {
        assert!(default_log_dir().ends_with(".jscope/logs"));
    }
}
