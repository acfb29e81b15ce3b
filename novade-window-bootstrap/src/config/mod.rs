//! Configuration for the window bootstrap.
//!
//! - [`types`]: the schema, rooted at [`BootstrapConfig`].
//! - [`defaults`]: default values used by `serde` for missing fields.
//! - [`loader`]: [`ConfigLoader`], which locates, parses and validates the
//!   TOML file.
//!
//! # Examples
//!
//! ```rust,ignore
//! use novade_window_bootstrap::config::ConfigLoader;
//!
//! match ConfigLoader::load() {
//!     Ok(config) => println!("Window size: {}x{}", config.window.width, config.window.height),
//!     Err(e) => {
//!         novade_window_bootstrap::logging::init_minimal_logging();
//!         tracing::error!("Configuration error: {}", e);
//!     }
//! }
//! ```

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::{ConfigLoader, CONFIG_PATH_ENV};
pub use types::{Background, BootstrapConfig, DiagnosticsConfig, DisplayConfig, GpuConfig, LoggingConfig, WindowConfig};
