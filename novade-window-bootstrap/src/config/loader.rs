//! Configuration loading.
//!
//! [`ConfigLoader::load`] reads `bootstrap.toml` from the path in
//! `$NOVADE_BOOTSTRAP_CONFIG`, or from
//! `<XDG config dir>/NovaDE/window-bootstrap/bootstrap.toml` when the variable
//! is unset. A missing or empty file yields the default configuration. The
//! result always passes through [`ConfigLoader::validate_config`].

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories_next::{BaseDirs, ProjectDirs};
use tracing::debug;

use super::types::BootstrapConfig;
use crate::error::ConfigError;
use crate::gpu::{ClientApi, ContextProfile};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "NOVADE_BOOTSTRAP_CONFIG";

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "NovaDE";
const APPLICATION: &str = "window-bootstrap";

/// Namespace for loading and validating [`BootstrapConfig`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the configuration from its standard location.
    pub fn load() -> Result<BootstrapConfig, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// `$NOVADE_BOOTSTRAP_CONFIG`, else the per-user default location.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let base = BaseDirs::new().ok_or_else(|| ConfigError::DirectoryUnavailable {
            dir_type: "User Config".to_string(),
        })?;
        Ok(base.config_dir().join(ORGANIZATION).join(APPLICATION).join("bootstrap.toml"))
    }

    /// Loads and validates the configuration at `path`.
    ///
    /// A file that does not exist is not an error.
    pub fn load_from_path(path: &Path) -> Result<BootstrapConfig, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loading configuration from {}.", path.display());
                Self::from_toml_str(&content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No configuration at {}; using defaults.", path.display());
                let mut config = BootstrapConfig::default();
                Self::validate_config(&mut config)?;
                Ok(config)
            }
            Err(e) => Err(ConfigError::ReadError { path: path.to_path_buf(), source: e }),
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<BootstrapConfig, ConfigError> {
        let mut config: BootstrapConfig =
            if content.trim().is_empty() { BootstrapConfig::default() } else { toml::from_str(content)? };
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    /// Validates `config`, normalizing it in place.
    ///
    /// Log level and format are lower-cased, a relative log file path is
    /// resolved against the application data directory, and an empty display
    /// name is treated as unset.
    pub fn validate_config(config: &mut BootstrapConfig) -> Result<(), ConfigError> {
        let level = config.logging.level.to_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => config.logging.level = level,
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: '{}'. Must be one of trace, debug, info, warn, error.",
                    config.logging.level
                )));
            }
        }

        let format = config.logging.format.to_lowercase();
        match format.as_str() {
            "text" | "json" => config.logging.format = format,
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: '{}'. Must be one of text, json.",
                    config.logging.format
                )));
            }
        }

        if let Some(path) = &config.logging.file_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError("logging.file_path must not be empty.".to_string()));
            }
            if path.is_relative() {
                let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or_else(|| {
                    ConfigError::DirectoryUnavailable { dir_type: "App Data".to_string() }
                })?;
                config.logging.file_path = Some(dirs.data_local_dir().join(path));
            }
        }

        if config.display.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            config.display.name = None;
        }

        let window = &config.window;
        if window.width == 0 || window.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "Window size must be non-zero, got {}x{}.",
                window.width, window.height
            )));
        }

        let gpu = &config.gpu;
        if gpu.version_major == 0 {
            return Err(ConfigError::ValidationError("gpu.version_major must be at least 1.".to_string()));
        }
        match gpu.api {
            ClientApi::OpenGlEs if gpu.version_major > 3 => {
                return Err(ConfigError::ValidationError(format!(
                    "OpenGL ES {}.{} does not exist.",
                    gpu.version_major, gpu.version_minor
                )));
            }
            ClientApi::OpenGl
                if gpu.profile == ContextProfile::Core && (gpu.version_major, gpu.version_minor) < (3, 2) =>
            {
                return Err(ConfigError::ValidationError(format!(
                    "The core profile requires OpenGL 3.2 or later, got {}.{}.",
                    gpu.version_major, gpu.version_minor
                )));
            }
            _ => {}
        }

        if config.diagnostics.enabled && config.diagnostics.libraries.is_empty() {
            return Err(ConfigError::ValidationError(
                "diagnostics.libraries must name at least one library when diagnostics are enabled.".to_string(),
            ));
        }

        Ok(())
    }
}
