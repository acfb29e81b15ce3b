//! Configuration data structures.
//!
//! All structs are deserialized from TOML with `serde`, take their defaults
//! from [`super::defaults`] and reject unknown fields.

use std::path::PathBuf;

use serde::Deserialize;

use super::defaults;
use crate::display::{RequestModeKind, ScreenInfo};
use crate::gpu::{ClientApi, ContextProfile, ContextRequest, FramebufferRequirements};
use crate::window::{Geometry, WindowProperty};

/// Root configuration of the `window-bootstrap` binary.
///
/// # Examples
///
/// ```
/// use novade_window_bootstrap::config::BootstrapConfig;
///
/// let config: BootstrapConfig = toml::from_str(r#"
/// hold_seconds = 2
///
/// [window]
/// width = 800
/// height = 600
/// "#).unwrap();
/// assert_eq!(config.hold_seconds, 2);
/// assert_eq!(config.window.width, 800);
/// assert_eq!(config.window.border_width, 1);
/// assert!(config.gpu.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    #[serde(default = "defaults::default_display_config")]
    pub display: DisplayConfig,
    #[serde(default = "defaults::default_window_config")]
    pub window: WindowConfig,
    #[serde(default = "defaults::default_gpu_config")]
    pub gpu: GpuConfig,
    #[serde(default = "defaults::default_diagnostics_config")]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
    /// Seconds the mapped window is held before teardown.
    #[serde(default = "defaults::default_hold_seconds")]
    pub hold_seconds: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            display: defaults::default_display_config(),
            window: defaults::default_window_config(),
            gpu: defaults::default_gpu_config(),
            diagnostics: defaults::default_diagnostics_config(),
            logging: defaults::default_logging_config(),
            hold_seconds: defaults::default_hold_seconds(),
        }
    }
}

/// Which display server to connect to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Display name such as `":1"`. `None` uses `$DISPLAY`.
    #[serde(default)]
    pub name: Option<String>,
    /// Screen index. `None` uses the screen named by the display string.
    #[serde(default)]
    pub screen: Option<usize>,
}

/// Window background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// The screen's white pixel.
    White,
    /// The screen's black pixel.
    Black,
    /// A raw pixel value for the root visual.
    Pixel(u32),
}

impl Background {
    pub fn pixel(self, screen: &ScreenInfo) -> u32 {
        match self {
            Background::White => screen.white_pixel,
            Background::Black => screen.black_pixel,
            Background::Pixel(pixel) => pixel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    #[serde(default)]
    pub x: i16,
    #[serde(default)]
    pub y: i16,
    #[serde(default = "defaults::default_window_width")]
    pub width: u16,
    #[serde(default = "defaults::default_window_height")]
    pub height: u16,
    #[serde(default = "defaults::default_border_width")]
    pub border_width: u16,
    #[serde(default = "defaults::default_background")]
    pub background: Background,
    /// Mode used for create, map and destroy.
    #[serde(default)]
    pub request_mode: RequestModeKind,
}

impl WindowConfig {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.x, self.y, self.width, self.height, self.border_width)
    }

    /// Property overrides for a window created on `screen`.
    pub fn properties(&self, screen: &ScreenInfo) -> Vec<WindowProperty> {
        vec![WindowProperty::BackgroundPixel(self.background.pixel(screen))]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GpuConfig {
    /// When `false` the run stops after mapping the window.
    #[serde(default = "defaults::default_true")]
    pub enabled: bool,
    #[serde(default = "defaults::default_client_api")]
    pub api: ClientApi,
    #[serde(default = "defaults::default_version_major")]
    pub version_major: u8,
    #[serde(default = "defaults::default_version_minor")]
    pub version_minor: u8,
    /// Ignored for OpenGL ES.
    #[serde(default = "defaults::default_profile")]
    pub profile: ContextProfile,
    #[serde(default)]
    pub framebuffer: FramebufferRequirements,
}

impl GpuConfig {
    pub fn context_request(&self) -> ContextRequest {
        ContextRequest {
            api: self.api,
            major: self.version_major,
            minor: self.version_minor,
            profile: self.profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    #[serde(default = "defaults::default_true")]
    pub enabled: bool,
    /// Client libraries tried in order; the first that loads is probed.
    #[serde(default = "defaults::default_client_libraries")]
    pub libraries: Vec<String>,
}

/// Configuration settings for the logging subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of "trace", "debug", "info", "warn", "error" (case-insensitive).
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional log file. Relative paths are resolved against the data
    /// directory during validation.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}
