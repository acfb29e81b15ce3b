//! GPU context negotiation.
//!
//! [`GpuPlatform`] is the boundary to the GPU stack (EGL in production, see
//! [`EglPlatform`]). [`GpuBootstrapper`] drives it through the five stages
//! that turn a mapped window into a window with a current rendering context:
//!
//! 1. display acquisition
//! 2. initialization (version negotiation)
//! 3. client API binding
//! 4. framebuffer configuration selection
//! 5. surface and context creation, then activation
//!
//! The result is a [`GpuContext`] that borrows the window it renders to and
//! releases its resources in reverse order.

use std::fmt;

use serde::Deserialize;

use crate::display::{NativeDisplay, WindowId};

mod bootstrap;
mod egl;

pub use bootstrap::{select_config, GpuBootstrapper, GpuContext};
pub use egl::{EglError, EglPlatform};

/// Client rendering API a context targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ClientApi {
    /// Desktop OpenGL.
    #[serde(rename = "opengl")]
    OpenGl,
    #[serde(rename = "opengl_es")]
    OpenGlEs,
}

impl fmt::Display for ClientApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientApi::OpenGl => f.write_str("OpenGL"),
            ClientApi::OpenGlEs => f.write_str("OpenGL ES"),
        }
    }
}

/// Desktop OpenGL context profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextProfile {
    Core,
    Compatibility,
}

/// Buffer layout a framebuffer configuration must provide.
///
/// Sizes are minimums, as in `eglChooseConfig`. The surface type is always
/// window-capable and the configuration must be conformant to the bound API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FramebufferRequirements {
    pub red_size: u8,
    pub green_size: u8,
    pub blue_size: u8,
    pub alpha_size: u8,
    pub depth_size: u8,
    pub stencil_size: u8,
}

impl Default for FramebufferRequirements {
    fn default() -> Self {
        // No alpha: lets the 24-bit visual of a default root window match.
        Self { red_size: 8, green_size: 8, blue_size: 8, alpha_size: 0, depth_size: 24, stencil_size: 8 }
    }
}

impl fmt::Display for FramebufferRequirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R{}G{}B{}A{} depth {} stencil {}",
            self.red_size, self.green_size, self.blue_size, self.alpha_size, self.depth_size, self.stencil_size
        )
    }
}

/// Version and profile requested for a new context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRequest {
    pub api: ClientApi,
    pub major: u8,
    pub minor: u8,
    /// Only meaningful for desktop OpenGL.
    pub profile: ContextProfile,
}

impl fmt::Display for ContextRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.api, self.major, self.minor)?;
        if self.api == ClientApi::OpenGl {
            let profile = match self.profile {
                ContextProfile::Core => "core",
                ContextProfile::Compatibility => "compatibility",
            };
            write!(f, " {profile}")?;
        }
        Ok(())
    }
}

/// Strings the GPU display can report about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayString {
    Vendor,
    Version,
    ClientApis,
}

/// What the GPU display reported during initialization. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayInfo {
    pub major: i32,
    pub minor: i32,
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub client_apis: Option<String>,
}

/// Boundary to the GPU stack.
///
/// Handles are opaque to the bootstrap; implementations pick whatever type
/// the underlying API uses.
pub trait GpuPlatform {
    type Display: Copy + fmt::Debug;
    type Config: Copy + PartialEq + fmt::Debug;
    type Surface: Copy + fmt::Debug;
    type Context: Copy + fmt::Debug;
    type Error: fmt::Display;

    /// Obtains the GPU display for a session and screen.
    fn platform_display(&self, native: NativeDisplay) -> Result<Self::Display, Self::Error>;

    /// Negotiates the protocol version, returning `(major, minor)`.
    fn initialize(&self, display: Self::Display) -> Result<(i32, i32), Self::Error>;

    fn query_string(&self, display: Self::Display, name: DisplayString) -> Result<String, Self::Error>;

    /// Selects the client API for the calling thread.
    fn bind_api(&self, api: ClientApi) -> Result<(), Self::Error>;

    /// Every configuration matching `requirements` for `api`, in the
    /// platform's preference order.
    fn choose_configs(
        &self,
        display: Self::Display,
        api: ClientApi,
        requirements: &FramebufferRequirements,
    ) -> Result<Vec<Self::Config>, Self::Error>;

    fn create_window_surface(
        &self,
        display: Self::Display,
        config: Self::Config,
        window: WindowId,
    ) -> Result<Self::Surface, Self::Error>;

    fn create_context(
        &self,
        display: Self::Display,
        config: Self::Config,
        request: &ContextRequest,
    ) -> Result<Self::Context, Self::Error>;

    /// Makes `(surface, surface, context)` current on the calling thread, or
    /// releases the current context when `binding` is `None`.
    fn make_current(
        &self,
        display: Self::Display,
        binding: Option<(Self::Surface, Self::Context)>,
    ) -> Result<(), Self::Error>;

    fn destroy_context(&self, display: Self::Display, context: Self::Context) -> Result<(), Self::Error>;

    fn destroy_surface(&self, display: Self::Display, surface: Self::Surface) -> Result<(), Self::Error>;

    /// Releases the display binding.
    fn terminate(&self, display: Self::Display) -> Result<(), Self::Error>;
}
