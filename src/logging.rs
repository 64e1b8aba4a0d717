//! Console and size-rotated file logging.

use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub debug: bool,
    pub file: PathBuf,
    /// Rotate once the file grows past this many MiB.
    pub max_size_mb: u64,
    /// Rotated files kept as `<file>.1` .. `<file>.N`.
    pub backup_count: usize,
}

impl LogSettings {
    fn max_bytes(&self) -> usize {
        usize::try_from(self.max_size_mb.saturating_mul(BYTES_PER_MB)).unwrap_or(usize::MAX)
    }
}

/// Installed logging sinks.
///
/// The subscriber is the default for the current thread for as long as this
/// handle lives. Dropping it flushes the file sink.
pub struct Logging {
    _default: DefaultGuard,
    _file: Option<WorkerGuard>,
}

impl Logging {
    /// Build the stdout and rotating-file sinks with one shared filter and format.
    ///
    /// A log file that cannot be opened degrades to console-only logging.
    pub fn init(settings: &LogSettings) -> Self {
        let level = if settings.debug { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let timer = ChronoLocal::new(TIME_FORMAT.to_string());

        let console = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(std::io::stdout().is_terminal())
            .with_target(false)
            .with_timer(timer.clone());

        let (file_layer, file_guard, file_error) = match open_rotating(settings) {
            Ok(writer) => {
                let (writer, guard) = tracing_appender::non_blocking(writer);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false)
                    .with_timer(timer);
                (Some(layer), Some(guard), None)
            }
            Err(e) => (None, None, Some(e)),
        };

        let subscriber = Registry::default()
            .with(filter)
            .with(console)
            .with(file_layer);
        let default = tracing::subscriber::set_default(subscriber);

        if let Some(e) = file_error {
            tracing::warn!(
                "Cannot open log file {}: {}; logging to console only",
                settings.file.display(),
                e
            );
        }

        Self {
            _default: default,
            _file: file_guard,
        }
    }
}

fn open_rotating(settings: &LogSettings) -> std::io::Result<FileRotate<AppendCount>> {
    // FileRotate opens lazily; open once here so failures surface early.
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.file)?;

    Ok(FileRotate::new(
        &settings.file,
        AppendCount::new(settings.backup_count),
        ContentLimit::BytesSurpassed(settings.max_bytes()),
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}
