//! EGL implementation of [`GpuPlatform`] over an XCB connection.

use std::ffi::c_void;
use std::fmt;

use khronos_egl as egl;
use once_cell::unsync::OnceCell;
use thiserror::Error;
use tracing::debug;

use super::{ClientApi, ContextProfile, ContextRequest, DisplayString, FramebufferRequirements, GpuPlatform};
use crate::display::{NativeDisplay, WindowId};

// EGL_EXT_platform_xcb
const PLATFORM_XCB_EXT: egl::Enum = 0x31DC;
const PLATFORM_XCB_SCREEN_EXT: egl::Attrib = 0x31DE;

// EGL 1.5 / EGL_KHR_create_context
const CONTEXT_MAJOR_VERSION: egl::Int = 0x3098;
const CONTEXT_MINOR_VERSION: egl::Int = 0x30FB;
const CONTEXT_OPENGL_PROFILE_MASK: egl::Int = 0x30FD;
const CONTEXT_OPENGL_CORE_PROFILE_BIT: egl::Int = 0x0000_0001;
const CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT: egl::Int = 0x0000_0002;

type Instance = egl::DynamicInstance<egl::EGL1_5>;

/// The system EGL library, loaded on first use.
///
/// Constructing the platform touches nothing. `libEGL` is opened when the
/// first display is requested, so a missing library surfaces as a GPU
/// display failure after the window is mapped.
#[derive(Default)]
pub struct EglPlatform {
    egl: OnceCell<Instance>,
}

impl fmt::Debug for EglPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EglPlatform").field("loaded", &self.is_loaded()).finish()
    }
}

/// Failure of an EGL call, or of loading the library behind it.
#[derive(Debug, Error)]
pub enum EglError {
    #[error("failed to load libEGL with EGL 1.5: {0}")]
    Load(String),
    #[error("{0}")]
    Call(egl::Error),
}

impl From<egl::Error> for EglError {
    fn from(e: egl::Error) -> Self {
        EglError::Call(e)
    }
}

impl EglPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `libEGL` has been opened yet.
    pub fn is_loaded(&self) -> bool {
        self.egl.get().is_some()
    }

    fn instance(&self) -> Result<&Instance, EglError> {
        self.egl.get_or_try_init(|| {
            // SAFETY: libEGL has no initialization side effects beyond symbol resolution.
            let egl = unsafe { Instance::load_required() }.map_err(|e| EglError::Load(e.to_string()))?;
            debug!("Loaded libEGL (EGL 1.5 entry points).");
            Ok(egl)
        })
    }
}

impl GpuPlatform for EglPlatform {
    type Display = egl::Display;
    type Config = egl::Config;
    type Surface = egl::Surface;
    type Context = egl::Context;
    type Error = EglError;

    fn platform_display(&self, native: NativeDisplay) -> Result<egl::Display, EglError> {
        if native.connection.is_null() {
            return Err(egl::Error::BadDisplay.into());
        }
        let instance = self.instance()?;
        let attributes = [PLATFORM_XCB_SCREEN_EXT, native.screen as egl::Attrib, egl::ATTRIB_NONE];
        // SAFETY: the connection pointer comes from a live session, which the
        // window (and therefore every GPU resource) borrows.
        Ok(unsafe { instance.get_platform_display(PLATFORM_XCB_EXT, native.connection, &attributes) }?)
    }

    fn initialize(&self, display: egl::Display) -> Result<(i32, i32), EglError> {
        Ok(self.instance()?.initialize(display)?)
    }

    fn query_string(&self, display: egl::Display, name: DisplayString) -> Result<String, EglError> {
        let name = match name {
            DisplayString::Vendor => egl::VENDOR,
            DisplayString::Version => egl::VERSION,
            DisplayString::ClientApis => egl::CLIENT_APIS,
        };
        let value = self.instance()?.query_string(Some(display), name)?;
        Ok(value.to_string_lossy().into_owned())
    }

    fn bind_api(&self, api: ClientApi) -> Result<(), EglError> {
        let api = match api {
            ClientApi::OpenGl => egl::OPENGL_API,
            ClientApi::OpenGlEs => egl::OPENGL_ES_API,
        };
        Ok(self.instance()?.bind_api(api)?)
    }

    fn choose_configs(
        &self,
        display: egl::Display,
        api: ClientApi,
        requirements: &FramebufferRequirements,
    ) -> Result<Vec<egl::Config>, EglError> {
        let attributes = config_attributes(api, requirements);
        let instance = self.instance()?;
        let count = instance.matching_config_count(display, &attributes)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut configs = Vec::with_capacity(count);
        instance.choose_config(display, &attributes, &mut configs)?;
        Ok(configs)
    }

    fn create_window_surface(
        &self,
        display: egl::Display,
        config: egl::Config,
        window: WindowId,
    ) -> Result<egl::Surface, EglError> {
        // EGL_EXT_platform_xcb takes a pointer to the xcb_window_t, read during the call.
        let mut native_window: u32 = window;
        let native_window = (&mut native_window as *mut u32).cast::<c_void>();
        let instance = self.instance()?;
        // SAFETY: `native_window` points to a live local for the duration of the call.
        Ok(unsafe { instance.create_platform_window_surface(display, config, native_window, &[egl::ATTRIB_NONE]) }?)
    }

    fn create_context(
        &self,
        display: egl::Display,
        config: egl::Config,
        request: &ContextRequest,
    ) -> Result<egl::Context, EglError> {
        Ok(self.instance()?.create_context(display, config, None, &context_attributes(request))?)
    }

    fn make_current(
        &self,
        display: egl::Display,
        binding: Option<(egl::Surface, egl::Context)>,
    ) -> Result<(), EglError> {
        let instance = self.instance()?;
        match binding {
            Some((surface, context)) => instance.make_current(display, Some(surface), Some(surface), Some(context))?,
            None => instance.make_current(display, None, None, None)?,
        }
        Ok(())
    }

    fn destroy_context(&self, display: egl::Display, context: egl::Context) -> Result<(), EglError> {
        Ok(self.instance()?.destroy_context(display, context)?)
    }

    fn destroy_surface(&self, display: egl::Display, surface: egl::Surface) -> Result<(), EglError> {
        Ok(self.instance()?.destroy_surface(display, surface)?)
    }

    fn terminate(&self, display: egl::Display) -> Result<(), EglError> {
        Ok(self.instance()?.terminate(display)?)
    }
}

/// `eglChooseConfig` attribute list for a window-capable, conformant config.
pub(crate) fn config_attributes(api: ClientApi, requirements: &FramebufferRequirements) -> Vec<egl::Int> {
    let renderable = match api {
        ClientApi::OpenGl => egl::OPENGL_BIT,
        ClientApi::OpenGlEs => egl::OPENGL_ES2_BIT,
    };
    vec![
        egl::SURFACE_TYPE,
        egl::WINDOW_BIT,
        egl::RENDERABLE_TYPE,
        renderable,
        egl::CONFORMANT,
        renderable,
        egl::RED_SIZE,
        egl::Int::from(requirements.red_size),
        egl::GREEN_SIZE,
        egl::Int::from(requirements.green_size),
        egl::BLUE_SIZE,
        egl::Int::from(requirements.blue_size),
        egl::ALPHA_SIZE,
        egl::Int::from(requirements.alpha_size),
        egl::DEPTH_SIZE,
        egl::Int::from(requirements.depth_size),
        egl::STENCIL_SIZE,
        egl::Int::from(requirements.stencil_size),
        egl::NONE,
    ]
}

/// `eglCreateContext` attribute list. The profile mask is desktop-only.
pub(crate) fn context_attributes(request: &ContextRequest) -> Vec<egl::Int> {
    let mut attributes = vec![
        CONTEXT_MAJOR_VERSION,
        egl::Int::from(request.major),
        CONTEXT_MINOR_VERSION,
        egl::Int::from(request.minor),
    ];
    if request.api == ClientApi::OpenGl {
        let profile = match request.profile {
            ContextProfile::Core => CONTEXT_OPENGL_CORE_PROFILE_BIT,
            ContextProfile::Compatibility => CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT,
        };
        attributes.extend([CONTEXT_OPENGL_PROFILE_MASK, profile]);
    }
    attributes.push(egl::NONE);
    attributes
}
