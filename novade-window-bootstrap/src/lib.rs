//! # NovaDE Window Bootstrap (`novade-window-bootstrap`)
//!
//! Brings up a single top-level X11 window and, optionally, a current EGL
//! rendering context bound to it, then tears everything down in reverse
//! order. It is the smallest end-to-end exercise of the display and GPU
//! stacks that NovaDE components build on.
//!
//! ## Layers
//!
//! - **Display**: [`display`] defines the transport boundary and the
//!   checked/unchecked [`RequestMode`]s; [`session`] owns the connection and
//!   [`window`] manages the window lifecycle on top of it.
//! - **GPU**: [`gpu`] negotiates a context in five stages through the
//!   [`GpuPlatform`] boundary, with [`EglPlatform`] as the production backend.
//! - **Diagnostics**: [`diagnostics`] asks the client GL library which
//!   implementation serves the context. Best-effort only.
//! - **Orchestration**: [`bootstrap::run`] chains the stages and guarantees
//!   that the session is closed exactly once.
//! - **Ambient**: [`config`] (TOML), [`logging`] (`tracing`) and [`error`]
//!   (`thiserror`).
//!
//! Lifetimes encode the teardown order: a [`Window`] borrows its [`Session`],
//! a [`GpuContext`] borrows its [`Window`], and [`Session::close`] consumes
//! the session.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use novade_window_bootstrap::{bootstrap, config::ConfigLoader, EglPlatform, XcbConnector};
//!
//! let config = ConfigLoader::load()?;
//! novade_window_bootstrap::logging::init_logging(&config.logging)?;
//!
//! let egl = EglPlatform::new();
//! let connector = XcbConnector::new(config.display.name.clone());
//! let report = bootstrap::run(connector, Some(&egl), &config)?;
//! tracing::info!("Window {:#x} bootstrapped on screen {}.", report.window, report.screen.index);
//! ```

pub mod bootstrap;
pub mod config;
pub mod diagnostics;
pub mod display;
pub mod error;
pub mod gpu;
pub mod logging;
pub mod session;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{run, BootstrapReport, GpuSummary};
pub use config::{BootstrapConfig, ConfigLoader};
pub use display::{Checked, RequestMode, RequestModeKind, ScreenInfo, Unchecked, WindowId, XcbConnector};
pub use error::{BootstrapError, ConfigError, GpuError, LoggingError, RequestError, SessionError, WindowError};
pub use gpu::{EglPlatform, GpuBootstrapper, GpuContext, GpuPlatform};
pub use session::Session;
pub use window::{Geometry, Window, WindowProperty, WindowState};
