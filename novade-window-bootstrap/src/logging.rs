//! Logging setup for the bootstrap binary.
//!
//! Built on the `tracing` ecosystem: a console layer (text or JSON) plus an
//! optional daily-rolling file layer. Library code only emits `tracing`
//! events; installing a subscriber is the binary's job.

use std::fs;
use std::io::stdout;
use std::path::Path;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::LoggingError;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the file writer's worker alive so buffered lines are flushed on exit.
static LOG_WORKER_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Installs an `EnvFilter`-driven subscriber writing to `stderr`.
///
/// Used before the configuration is available, or when loading it failed.
/// Defaults to `info` when `RUST_LOG` is unset or invalid. Does nothing if a
/// subscriber is already installed.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init();
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// [`LoggingError::InitializationFailure`] for an invalid level or when a
/// subscriber is already installed, [`LoggingError::Io`] when the log
/// directory cannot be created.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let level = parse_level(&config.level)?;

    let console_layer = match config.format.to_lowercase().as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(stdout)
            .with_ansi(false)
            .with_filter(EnvFilter::new(level.to_string()))
            .boxed(),
        _ => fmt::layer()
            .with_writer(stdout)
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_filter(EnvFilter::new(level.to_string()))
            .boxed(),
    };

    let mut layers: Vec<BoxedLayer> = vec![console_layer];
    let mut file_guard = None;
    if let Some(log_path) = &config.file_path {
        let (file_layer, guard) = create_file_layer(log_path, &config.format)?;
        layers.push(file_layer.with_filter(EnvFilter::new(level.to_string())).boxed());
        file_guard = Some(guard);
    }

    Registry::default().with(layers).try_init().map_err(|e| {
        LoggingError::InitializationFailure(format!(
            "Failed to set global tracing subscriber. Was it already initialized? Error: {e}"
        ))
    })?;

    match LOG_WORKER_GUARD.lock() {
        Ok(mut slot) => *slot = file_guard,
        Err(e) => eprintln!("[ERROR] Failed to store the log worker guard: {e}. File logs may be lost on exit."),
    }
    Ok(())
}

fn parse_level(level: &str) -> Result<Level, LoggingError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        invalid => Err(LoggingError::InitializationFailure(format!("Invalid log level in config: {invalid}"))),
    }
}

/// Daily-rolling, non-blocking file layer in `format` ("text" or "json").
fn create_file_layer(log_path: &Path, format: &str) -> Result<(BoxedLayer, WorkerGuard), LoggingError> {
    let directory = log_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)?;

    let file_name = log_path
        .file_name()
        .ok_or_else(|| LoggingError::InitializationFailure(format!("{} has no file name", log_path.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, file_name));

    let layer = match format.to_lowercase().as_str() {
        "json" => fmt::layer().json().with_writer(writer).with_ansi(false).boxed(),
        _ => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
    };
    Ok((layer, guard))
}
