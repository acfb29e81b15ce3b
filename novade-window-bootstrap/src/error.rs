//! Error handling for the window bootstrap.
//!
//! Every stage of the bootstrap has its own error type, defined with
//! `thiserror`. The stage types are aggregated by [`BootstrapError`], which is
//! what [`crate::bootstrap::run`] returns. Each error renders as a single line
//! that names the stage that failed.
//!
//! - [`SessionError`]: connecting to the display server and allocating ids.
//! - [`RequestError`]: a single display-server request (create, map, destroy).
//! - [`WindowError`]: the window lifecycle stage a [`RequestError`] happened in.
//! - [`GpuError`]: the five stages of GPU context negotiation.
//! - [`DiagnosticsError`]: best-effort client library probing. Never aborts a run.
//! - [`ConfigError`] and [`LoggingError`]: ambient setup.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::gpu::ClientApi;

/// Error returned by the bootstrap sequence.
///
/// Wraps the stage-specific error of the first stage that failed.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The display-server session could not be established.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A window lifecycle request failed.
    #[error(transparent)]
    Window(#[from] WindowError),

    /// GPU context negotiation failed.
    #[error(transparent)]
    Gpu(#[from] GpuError),

    /// Configuration could not be loaded or validated.
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// The logging system could not be initialized.
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),
}

impl BootstrapError {
    /// Short name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            BootstrapError::Session(_) => "connection",
            BootstrapError::Window(err) => err.stage(),
            BootstrapError::Gpu(err) => err.stage(),
            BootstrapError::Config(_) => "configuration",
            BootstrapError::Logging(_) => "logging",
        }
    }

    /// One-line report of the failure, prefixed with the stage.
    ///
    /// The stage errors already render their cause, so the `source()` chain
    /// is not appended again.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.stage(), self)
    }
}

/// Errors raised while opening or using the display-server session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport could not be established or reported an error state
    /// immediately after connecting.
    #[error("Unable to connect to the display server: {0}")]
    Connection(String),

    /// The requested screen does not exist on the display server.
    #[error("Unable to connect to the display server: screen {requested} requested but only {available} available")]
    ScreenUnavailable { requested: usize, available: usize },

    /// The connection's resource id space is exhausted.
    #[error("Unable to allocate a resource id: {0}")]
    IdAllocation(String),
}

/// Details of an error reply sent by the display server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRejection {
    /// Raw protocol error code.
    pub error_code: u8,
    /// Human-readable error kind, e.g. `Match` or `Value`.
    pub kind: String,
    /// The offending value reported by the server (resource id, visual, ...).
    pub bad_value: u32,
    /// Sequence number of the rejected request.
    pub sequence: u16,
}

impl fmt::Display for ServerRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error (code {}, bad value {:#x}, sequence {})",
            self.kind, self.error_code, self.bad_value, self.sequence
        )
    }
}

/// Failure of a single display-server request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server answered the request with an error reply.
    #[error("rejected by the display server: {0}")]
    Rejected(ServerRejection),

    /// The connection failed while sending the request or waiting for its reply.
    #[error("display connection failed: {0}")]
    Transport(String),

    /// The request was refused locally and never sent.
    #[error("invalid request: {0}")]
    Invalid(String),
}

/// Errors raised by the window lifecycle manager.
#[derive(Debug, Error)]
pub enum WindowError {
    /// The session could not hand out an id for the window.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Unable to create window: {0}")]
    Creation(#[source] RequestError),

    #[error("Unable to map window {window:#x}: {source}")]
    Map {
        window: u32,
        #[source]
        source: RequestError,
    },

    #[error("Unable to destroy window {window:#x}: {source}")]
    Destroy {
        window: u32,
        #[source]
        source: RequestError,
    },
}

impl WindowError {
    /// Short name of the lifecycle stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            WindowError::Session(_) => "connection",
            WindowError::Creation(_) => "window creation",
            WindowError::Map { .. } => "window map",
            WindowError::Destroy { .. } => "window destroy",
        }
    }

    /// The request-level error behind this failure, if a request was sent.
    pub fn request_error(&self) -> Option<&RequestError> {
        match self {
            WindowError::Session(_) => None,
            WindowError::Creation(source)
            | WindowError::Map { source, .. }
            | WindowError::Destroy { source, .. } => Some(source),
        }
    }
}

/// Errors raised by the GPU context bootstrapper, one variant per stage.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("GPU display unavailable: {0}")]
    DisplayUnavailable(String),

    #[error("GPU display initialization failed: {0}")]
    Initialization(String),

    #[error("Unable to bind client API {api}: {reason}")]
    ApiBind { api: ClientApi, reason: String },

    #[error("No framebuffer configuration matches the requirements: {0}")]
    NoMatchingConfig(String),

    #[error("Unable to create window surface: {0}")]
    SurfaceCreation(String),

    #[error("Unable to create rendering context: {0}")]
    ContextCreation(String),

    #[error("Unable to make rendering context current: {0}")]
    Activation(String),
}

impl GpuError {
    /// Short name of the GPU stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            GpuError::DisplayUnavailable(_) => "gpu display acquisition",
            GpuError::Initialization(_) => "gpu initialization",
            GpuError::ApiBind { .. } => "gpu api binding",
            GpuError::NoMatchingConfig(_) => "gpu configuration selection",
            GpuError::SurfaceCreation(_) => "gpu surface creation",
            GpuError::ContextCreation(_) => "gpu context creation",
            GpuError::Activation(_) => "gpu activation",
        }
    }
}

/// Client library diagnostics could not be collected.
///
/// This error is logged and discarded; it never aborts the bootstrap.
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("Diagnostics unavailable: none of {tried:?} could be loaded ({reason})")]
    LibraryUnavailable { tried: Vec<String>, reason: String },

    #[error("Diagnostics unavailable: symbol `{symbol}` not found in {library} ({reason})")]
    SymbolUnavailable {
        library: String,
        symbol: &'static str,
        reason: String,
    },

    #[error("Diagnostics unavailable: {library} returned no {property} string")]
    QueryFailed {
        library: String,
        property: &'static str,
    },
}

/// Error type for configuration-related operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An error occurred while attempting to read a configuration file.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A required base directory (XDG config home) could not be determined.
    #[error("Could not determine base directory for {dir_type}")]
    DirectoryUnavailable { dir_type: String },
}

/// Error type for logging-related operations.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),

    #[error("Logging I/O error: {0}")]
    Io(#[from] io::Error),
}
