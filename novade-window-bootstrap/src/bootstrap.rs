//! The bootstrap sequence: connect, create, map, negotiate a GPU context,
//! hold, tear down.
//!
//! Every stage consumes the resource of the stage before it and the first
//! failure ends the run. Resources are released in reverse order on every
//! path, and the session is closed exactly once, after everything borrowed
//! from it is gone.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::BootstrapConfig;
use crate::diagnostics::{self, ClientLibraryInfo};
use crate::display::{Connector, DisplayTransport, ScreenInfo, WindowId};
use crate::error::BootstrapError;
use crate::gpu::{ContextRequest, DisplayInfo, GpuBootstrapper, GpuContext, GpuPlatform};
use crate::session::Session;
use crate::window::Window;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub screen: ScreenInfo,
    pub window: WindowId,
    /// Present when a GPU platform was supplied.
    pub gpu: Option<GpuSummary>,
    /// Present when diagnostics were enabled and succeeded.
    pub diagnostics: Option<ClientLibraryInfo>,
}

/// What the GPU stack reported for the negotiated context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuSummary {
    pub request: ContextRequest,
    pub display: DisplayInfo,
}

/// Runs the whole sequence against the display server behind `connector`.
///
/// GPU negotiation is skipped when `gpu` is `None`.
pub fn run<C, P>(connector: C, gpu: Option<&P>, config: &BootstrapConfig) -> Result<BootstrapReport, BootstrapError>
where
    C: Connector,
    P: GpuPlatform,
{
    let session = Session::open(connector, config.display.screen)?;
    let result = drive(&session, gpu, config);
    session.close();

    match &result {
        Ok(report) => info!("Bootstrap of window {:#x} completed.", report.window),
        Err(e) => warn!("Bootstrap failed during {}: {}", e.stage(), e),
    }
    result
}

fn drive<T, P>(session: &Session<T>, gpu: Option<&P>, config: &BootstrapConfig) -> Result<BootstrapReport, BootstrapError>
where
    T: DisplayTransport,
    P: GpuPlatform,
{
    let screen = *session.screen();
    let mode = config.window.request_mode.strategy();

    let mut window = Window::create(
        session,
        &screen,
        config.window.geometry(),
        &config.window.properties(&screen),
        mode,
    )?;
    window.map(mode)?;

    let mut report = BootstrapReport { screen, window: window.id(), gpu: None, diagnostics: None };

    // The context borrows the window and must be gone before `destroy` moves it.
    {
        let context = match gpu {
            Some(platform) => {
                let bootstrapper =
                    GpuBootstrapper::new(platform, config.gpu.context_request(), config.gpu.framebuffer);
                Some(bootstrapper.establish(&window)?)
            }
            None => None,
        };

        if let Some(context) = &context {
            report.gpu = Some(GpuSummary { request: *context.request(), display: context.display_info().clone() });
            if config.diagnostics.enabled {
                report.diagnostics = match diagnostics::probe(&config.diagnostics.libraries) {
                    Ok(info) => Some(info),
                    Err(e) => {
                        warn!("{}", e);
                        None
                    }
                };
            }
        }

        if config.hold_seconds > 0 {
            info!("Holding window {:#x} for {} s.", window.id(), config.hold_seconds);
            thread::sleep(Duration::from_secs(config.hold_seconds));
        }

        context.into_iter().for_each(GpuContext::release);
    }

    window.destroy(mode)?;
    Ok(report)
}
