//! Scripted display-server and GPU fakes shared by the unit tests.
//!
//! Both fakes append every boundary call to one [`Journal`], so tests can
//! assert the global order of acquisition and release.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::ptr;
use std::rc::Rc;

use crate::display::{Connector, DisplayTransport, NativeDisplay, PendingReply, ScreenInfo, WindowId, WindowRequest};
use crate::error::{RequestError, ServerRejection, SessionError};
use crate::gpu::{ClientApi, ContextRequest, DisplayString, FramebufferRequirements, GpuPlatform};
use crate::window::WindowProperty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RequestKind {
    Create,
    Map,
    Destroy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Connect,
    Create { window: WindowId, background: Option<u32> },
    Map(WindowId),
    Destroy(WindowId),
    Checked(RequestKind),
    Detached(RequestKind),
    Flush,
    Disconnect,
    GetDisplay { screen: usize },
    Initialize,
    QueryString(DisplayString),
    BindApi(ClientApi),
    ChooseConfig,
    CreateSurface { window: WindowId, config: u32 },
    CreateContext { config: u32 },
    MakeCurrent,
    ReleaseCurrent,
    DestroyContext,
    DestroySurface,
    Terminate,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Rc<RefCell<Vec<Call>>>);

impl Journal {
    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    /// Window requests and how they were settled.
    pub(crate) fn requests(&self) -> Vec<Call> {
        self.filtered(|call| {
            matches!(
                call,
                Call::Create { .. } | Call::Map(_) | Call::Destroy(_) | Call::Checked(_) | Call::Detached(_)
            )
        })
    }

    /// Resource acquisitions and releases, without settles, flushes and queries.
    pub(crate) fn lifecycle(&self) -> Vec<Call> {
        self.filtered(|call| {
            !matches!(
                call,
                Call::Checked(_) | Call::Detached(_) | Call::Flush | Call::QueryString(_)
            )
        })
    }

    pub(crate) fn contains(&self, predicate: impl Fn(&Call) -> bool) -> bool {
        self.0.borrow().iter().any(predicate)
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|&call| predicate(call)).count()
    }

    fn filtered(&self, predicate: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.0.borrow().iter().filter(|&call| predicate(call)).cloned().collect()
    }
}

pub(crate) fn fake_screen(index: usize) -> ScreenInfo {
    let offset = u32::try_from(index).unwrap_or(0) * 0x100;
    ScreenInfo {
        index,
        root: 0x1000 + offset,
        root_visual: 0x21 + offset,
        root_depth: 24,
        white_pixel: 0x00ff_ffff,
        black_pixel: 0,
        width_in_pixels: 1920,
        height_in_pixels: 1080,
    }
}

/// Connector for a fake display server.
pub(crate) struct FakeConnector {
    journal: Journal,
    screens: Vec<ScreenInfo>,
    preferred: usize,
    connect_error: Option<String>,
    rejecting: HashSet<RequestKind>,
    ids_exhausted: bool,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self::with_journal(Journal::default())
    }

    pub(crate) fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            screens: vec![fake_screen(0)],
            preferred: 0,
            connect_error: None,
            rejecting: HashSet::new(),
            ids_exhausted: false,
        }
    }

    pub(crate) fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub(crate) fn with_screens(mut self, screens: Vec<ScreenInfo>) -> Self {
        self.screens = screens;
        self
    }

    pub(crate) fn preferring(mut self, screen: usize) -> Self {
        self.preferred = screen;
        self
    }

    pub(crate) fn failing_connect(mut self, reason: &str) -> Self {
        self.connect_error = Some(reason.to_string());
        self
    }

    /// Makes the server answer every request of `kind` with a `Match` error.
    pub(crate) fn rejecting(mut self, kind: RequestKind) -> Self {
        self.rejecting.insert(kind);
        self
    }

    /// Makes every window id allocation fail.
    pub(crate) fn exhausting_ids(mut self) -> Self {
        self.ids_exhausted = true;
        self
    }
}

impl Connector for FakeConnector {
    type Transport = FakeTransport;

    fn connect(self) -> Result<(FakeTransport, usize), SessionError> {
        if let Some(reason) = self.connect_error {
            return Err(SessionError::Connection(reason));
        }
        self.journal.push(Call::Connect);
        let transport = FakeTransport {
            journal: self.journal,
            screens: self.screens,
            rejecting: self.rejecting,
            ids_exhausted: self.ids_exhausted,
            next_id: Cell::new(0x0040_0000),
            sequence: Cell::new(0),
        };
        Ok((transport, self.preferred))
    }
}

#[derive(Debug)]
pub(crate) struct FakeTransport {
    journal: Journal,
    screens: Vec<ScreenInfo>,
    rejecting: HashSet<RequestKind>,
    ids_exhausted: bool,
    next_id: Cell<u32>,
    sequence: Cell<u16>,
}

impl DisplayTransport for FakeTransport {
    fn screens(&self) -> Vec<ScreenInfo> {
        self.screens.clone()
    }

    fn generate_id(&self) -> Result<WindowId, SessionError> {
        if self.ids_exhausted {
            return Err(SessionError::IdAllocation("no more XIDs available".to_string()));
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(id)
    }

    fn send<'a>(&'a self, request: WindowRequest<'_>) -> Result<Box<dyn PendingReply + 'a>, RequestError> {
        let sequence = self.sequence.get().wrapping_add(1);
        self.sequence.set(sequence);

        let kind = match request {
            WindowRequest::Create { window, properties, .. } => {
                let background = properties.iter().find_map(|property| match property {
                    WindowProperty::BackgroundPixel(pixel) => Some(*pixel),
                    _ => None,
                });
                self.journal.push(Call::Create { window, background });
                RequestKind::Create
            }
            WindowRequest::Map { window } => {
                self.journal.push(Call::Map(window));
                RequestKind::Map
            }
            WindowRequest::Destroy { window } => {
                self.journal.push(Call::Destroy(window));
                RequestKind::Destroy
            }
        };

        let rejection = self.rejecting.contains(&kind).then(|| ServerRejection {
            error_code: 8,
            kind: "Match".to_string(),
            bad_value: request.window(),
            sequence,
        });
        Ok(Box::new(FakePending { journal: self.journal.clone(), kind, rejection }))
    }

    fn flush(&self) -> Result<(), RequestError> {
        self.journal.push(Call::Flush);
        Ok(())
    }

    fn native_display(&self, screen: usize) -> NativeDisplay {
        NativeDisplay { connection: ptr::null_mut(), screen }
    }

    fn disconnect(&mut self) {
        self.journal.push(Call::Disconnect);
    }
}

struct FakePending {
    journal: Journal,
    kind: RequestKind,
    rejection: Option<ServerRejection>,
}

impl PendingReply for FakePending {
    fn check(self: Box<Self>) -> Result<(), RequestError> {
        self.journal.push(Call::Checked(self.kind));
        match self.rejection {
            Some(rejection) => Err(RequestError::Rejected(rejection)),
            None => Ok(()),
        }
    }

    fn detach(self: Box<Self>) {
        self.journal.push(Call::Detached(self.kind));
    }
}

/// GPU platform calls a [`FakeGpu`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum GpuStep {
    GetDisplay,
    Initialize,
    QueryString,
    BindApi,
    ChooseConfig,
    CreateSurface,
    CreateContext,
    MakeCurrent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeGpuError(String);

impl fmt::Display for FakeGpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// GPU platform with handles represented as integers.
#[derive(Debug)]
pub(crate) struct FakeGpu {
    journal: Journal,
    configs: Vec<u32>,
    failing: HashSet<GpuStep>,
}

impl FakeGpu {
    pub(crate) fn new(journal: Journal) -> Self {
        Self { journal, configs: vec![7, 3, 9], failing: HashSet::new() }
    }

    pub(crate) fn with_configs(mut self, configs: Vec<u32>) -> Self {
        self.configs = configs;
        self
    }

    pub(crate) fn failing(mut self, step: GpuStep) -> Self {
        self.failing.insert(step);
        self
    }

    fn step(&self, step: GpuStep, call: Call) -> Result<(), FakeGpuError> {
        self.journal.push(call);
        if self.failing.contains(&step) {
            Err(FakeGpuError(format!("{step:?} failed")))
        } else {
            Ok(())
        }
    }
}

impl GpuPlatform for FakeGpu {
    type Display = u32;
    type Config = u32;
    type Surface = u32;
    type Context = u32;
    type Error = FakeGpuError;

    fn platform_display(&self, native: NativeDisplay) -> Result<u32, FakeGpuError> {
        self.step(GpuStep::GetDisplay, Call::GetDisplay { screen: native.screen })?;
        Ok(1)
    }

    fn initialize(&self, _display: u32) -> Result<(i32, i32), FakeGpuError> {
        self.step(GpuStep::Initialize, Call::Initialize)?;
        Ok((1, 5))
    }

    fn query_string(&self, _display: u32, name: DisplayString) -> Result<String, FakeGpuError> {
        self.step(GpuStep::QueryString, Call::QueryString(name))?;
        Ok(match name {
            DisplayString::Vendor => "Fake".to_string(),
            DisplayString::Version => "1.5 Fake".to_string(),
            DisplayString::ClientApis => "OpenGL OpenGL_ES".to_string(),
        })
    }

    fn bind_api(&self, api: ClientApi) -> Result<(), FakeGpuError> {
        self.step(GpuStep::BindApi, Call::BindApi(api))
    }

    fn choose_configs(
        &self,
        _display: u32,
        _api: ClientApi,
        _requirements: &FramebufferRequirements,
    ) -> Result<Vec<u32>, FakeGpuError> {
        self.step(GpuStep::ChooseConfig, Call::ChooseConfig)?;
        Ok(self.configs.clone())
    }

    fn create_window_surface(&self, _display: u32, config: u32, window: WindowId) -> Result<u32, FakeGpuError> {
        self.step(GpuStep::CreateSurface, Call::CreateSurface { window, config })?;
        Ok(100)
    }

    fn create_context(&self, _display: u32, config: u32, _request: &ContextRequest) -> Result<u32, FakeGpuError> {
        self.step(GpuStep::CreateContext, Call::CreateContext { config })?;
        Ok(200)
    }

    fn make_current(&self, _display: u32, binding: Option<(u32, u32)>) -> Result<(), FakeGpuError> {
        match binding {
            Some(_) => self.step(GpuStep::MakeCurrent, Call::MakeCurrent),
            None => {
                self.journal.push(Call::ReleaseCurrent);
                Ok(())
            }
        }
    }

    fn destroy_context(&self, _display: u32, _context: u32) -> Result<(), FakeGpuError> {
        self.journal.push(Call::DestroyContext);
        Ok(())
    }

    fn destroy_surface(&self, _display: u32, _surface: u32) -> Result<(), FakeGpuError> {
        self.journal.push(Call::DestroySurface);
        Ok(())
    }

    fn terminate(&self, _display: u32) -> Result<(), FakeGpuError> {
        self.journal.push(Call::Terminate);
        Ok(())
    }
}
