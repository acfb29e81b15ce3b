use tracing::{debug, info, warn};

use super::{ClientApi, ContextRequest, DisplayInfo, DisplayString, FramebufferRequirements, GpuPlatform};
use crate::display::{DisplayTransport, WindowId};
use crate::error::GpuError;
use crate::window::Window;

/// Drives a [`GpuPlatform`] from a mapped window to a current context.
#[derive(Debug)]
pub struct GpuBootstrapper<'p, P: GpuPlatform> {
    platform: &'p P,
    request: ContextRequest,
    framebuffer: FramebufferRequirements,
}

impl<'p, P: GpuPlatform> GpuBootstrapper<'p, P> {
    pub fn new(platform: &'p P, request: ContextRequest, framebuffer: FramebufferRequirements) -> Self {
        Self { platform, request, framebuffer }
    }

    /// Runs the five bootstrap stages against `window`.
    ///
    /// The returned context borrows the window, so the window outlives every
    /// GPU resource bound to it. On failure, whatever the earlier stages
    /// acquired is released in reverse order before the error is returned.
    pub fn establish<'w, T>(&self, window: &'w Window<'_, T>) -> Result<GpuContext<'w, P>, GpuError>
    where
        'p: 'w,
        T: DisplayTransport,
    {
        let platform = self.platform;
        let api = self.request.api;
        let native = window.session().native_display();

        // Stage 1: display acquisition.
        let display = platform
            .platform_display(native)
            .map_err(|e| GpuError::DisplayUnavailable(e.to_string()))?;
        let mut resources = Resources::new(platform, display);
        debug!("GPU display acquired for screen {}.", native.screen);

        // Stage 2: initialization.
        let (major, minor) = platform
            .initialize(display)
            .map_err(|e| GpuError::Initialization(e.to_string()))?;
        let info = DisplayInfo {
            major,
            minor,
            vendor: query(platform, display, DisplayString::Vendor),
            version: query(platform, display, DisplayString::Version),
            client_apis: query(platform, display, DisplayString::ClientApis),
        };
        info!(
            "GPU display initialized: version {}.{}, vendor {}, client APIs {}.",
            major,
            minor,
            info.vendor.as_deref().unwrap_or("unknown"),
            info.client_apis.as_deref().unwrap_or("unknown")
        );

        // Stage 3: API binding.
        platform
            .bind_api(api)
            .map_err(|e| GpuError::ApiBind { api, reason: e.to_string() })?;
        debug!("Bound client API {}.", api);

        // Stage 4: configuration selection.
        let config = select_config(platform, display, api, &self.framebuffer)?;

        // Stage 5: surface, context, activation.
        let surface = platform
            .create_window_surface(display, config, window.id())
            .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?;
        resources.surface = Some(surface);

        let context = platform
            .create_context(display, config, &self.request)
            .map_err(|e| GpuError::ContextCreation(e.to_string()))?;
        resources.context = Some(context);

        platform
            .make_current(display, Some((surface, context)))
            .map_err(|e| GpuError::Activation(e.to_string()))?;
        resources.current = true;

        info!("{} context current on window {:#x}.", self.request, window.id());
        Ok(GpuContext {
            resources,
            window: window.id(),
            config,
            surface,
            context,
            request: self.request,
            info,
        })
    }
}

/// Picks the framebuffer configuration for `requirements`.
///
/// The first configuration returned by the platform wins, so the choice is
/// stable for a given display and requirement set.
pub fn select_config<P: GpuPlatform>(
    platform: &P,
    display: P::Display,
    api: ClientApi,
    requirements: &FramebufferRequirements,
) -> Result<P::Config, GpuError> {
    let configs = platform
        .choose_configs(display, api, requirements)
        .map_err(|e| GpuError::NoMatchingConfig(format!("{requirements} for {api}: {e}")))?;
    debug!("{} framebuffer configurations match {} for {}.", configs.len(), requirements, api);

    configs
        .first()
        .copied()
        .ok_or_else(|| GpuError::NoMatchingConfig(format!("{requirements} for {api}")))
}

fn query<P: GpuPlatform>(platform: &P, display: P::Display, name: DisplayString) -> Option<String> {
    match platform.query_string(display, name) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("GPU display string {:?} unavailable: {}", name, e);
            None
        }
    }
}

/// A current rendering context bound to a window surface.
#[derive(Debug)]
pub struct GpuContext<'w, P: GpuPlatform> {
    resources: Resources<'w, P>,
    window: WindowId,
    config: P::Config,
    surface: P::Surface,
    context: P::Context,
    request: ContextRequest,
    info: DisplayInfo,
}

impl<P: GpuPlatform> GpuContext<'_, P> {
    /// Version and strings reported by the GPU display.
    pub fn display_info(&self) -> &DisplayInfo {
        &self.info
    }

    pub fn request(&self) -> &ContextRequest {
        &self.request
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn config(&self) -> P::Config {
        self.config
    }

    pub fn surface(&self) -> P::Surface {
        self.surface
    }

    pub fn context(&self) -> P::Context {
        self.context
    }

    /// Releases the context, the surface and the display binding, in that order.
    pub fn release(mut self) {
        self.resources.release();
        info!("GPU resources for window {:#x} released.", self.window);
    }
}

/// Everything acquired from the platform so far, released in reverse on drop.
#[derive(Debug)]
struct Resources<'a, P: GpuPlatform> {
    platform: &'a P,
    display: P::Display,
    surface: Option<P::Surface>,
    context: Option<P::Context>,
    current: bool,
    live: bool,
}

impl<'a, P: GpuPlatform> Resources<'a, P> {
    fn new(platform: &'a P, display: P::Display) -> Self {
        Self { platform, display, surface: None, context: None, current: false, live: true }
    }

    fn release(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        let (platform, display) = (self.platform, self.display);

        if std::mem::take(&mut self.current) {
            if let Err(e) = platform.make_current(display, None) {
                warn!("Failed to release current GPU context: {}", e);
            }
        }
        if let Some(context) = self.context.take() {
            match platform.destroy_context(display, context) {
                Ok(()) => debug!("GPU context destroyed."),
                Err(e) => warn!("Failed to destroy GPU context: {}", e),
            }
        }
        if let Some(surface) = self.surface.take() {
            match platform.destroy_surface(display, surface) {
                Ok(()) => debug!("GPU surface destroyed."),
                Err(e) => warn!("Failed to destroy GPU surface: {}", e),
            }
        }
        match platform.terminate(display) {
            Ok(()) => debug!("GPU display terminated."),
            Err(e) => warn!("Failed to terminate GPU display: {}", e),
        }
    }
}

impl<P: GpuPlatform> Drop for Resources<'_, P> {
    fn drop(&mut self) {
        self.release();
    }
}
