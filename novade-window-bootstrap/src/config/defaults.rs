//! Default configuration values.
//!
//! These functions are referenced by `serde`'s `default` attribute in
//! [`super::types`], so a missing file, section or field falls back to the
//! values below.

use std::path::PathBuf;

use super::types::{Background, DiagnosticsConfig, DisplayConfig, GpuConfig, LoggingConfig, WindowConfig};
use crate::display::RequestModeKind;
use crate::gpu::{ClientApi, ContextProfile, FramebufferRequirements};

/// Seconds the window stays up before teardown.
pub(super) fn default_hold_seconds() -> u64 {
    10
}

pub(super) fn default_display_config() -> DisplayConfig {
    DisplayConfig { name: None, screen: None }
}

pub(super) fn default_window_config() -> WindowConfig {
    WindowConfig {
        x: 0,
        y: 0,
        width: default_window_width(),
        height: default_window_height(),
        border_width: default_border_width(),
        background: default_background(),
        request_mode: RequestModeKind::Checked,
    }
}

pub(super) fn default_window_width() -> u16 {
    1920
}

pub(super) fn default_window_height() -> u16 {
    1080
}

pub(super) fn default_border_width() -> u16 {
    1
}

pub(super) fn default_background() -> Background {
    Background::White
}

pub(super) fn default_gpu_config() -> GpuConfig {
    GpuConfig {
        enabled: true,
        api: default_client_api(),
        version_major: default_version_major(),
        version_minor: default_version_minor(),
        profile: default_profile(),
        framebuffer: FramebufferRequirements::default(),
    }
}

pub(super) fn default_client_api() -> ClientApi {
    ClientApi::OpenGl
}

pub(super) fn default_version_major() -> u8 {
    3
}

pub(super) fn default_version_minor() -> u8 {
    3
}

pub(super) fn default_profile() -> ContextProfile {
    ContextProfile::Core
}

pub(super) fn default_diagnostics_config() -> DiagnosticsConfig {
    DiagnosticsConfig { enabled: true, libraries: default_client_libraries() }
}

/// GLVND dispatch library first, legacy libGL second.
pub(super) fn default_client_libraries() -> Vec<String> {
    vec!["libOpenGL.so.0".to_string(), "libGL.so.1".to_string()]
}

pub(super) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: default_log_file_path(),
        format: default_log_format(),
    }
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

/// No log file by default.
pub(super) fn default_log_file_path() -> Option<PathBuf> {
    None
}

pub(super) fn default_log_format() -> String {
    "text".to_string()
}

pub(super) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_is_full_hd_with_border() {
        let window = default_window_config();
        assert_eq!((window.x, window.y, window.width, window.height), (0, 0, 1920, 1080));
        assert_eq!(window.border_width, 1);
        assert_eq!(window.background, Background::White);
        assert_eq!(window.request_mode, RequestModeKind::Checked);
    }

    #[test]
    fn test_default_gpu_requests_gl_33_core() {
        let gpu = default_gpu_config();
        assert!(gpu.enabled);
        assert_eq!(gpu.api, ClientApi::OpenGl);
        assert_eq!((gpu.version_major, gpu.version_minor), (3, 3));
        assert_eq!(gpu.profile, ContextProfile::Core);
    }

    #[test]
    fn test_default_logging_config_values() {
        let logging = default_logging_config();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.file_path, None);
        assert_eq!(logging.format, "text");
    }

    #[test]
    fn test_default_hold_seconds() {
        assert_eq!(default_hold_seconds(), 10);
    }
}
