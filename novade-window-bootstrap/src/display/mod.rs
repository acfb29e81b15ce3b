//! Display-server boundary.
//!
//! The bootstrap talks to the windowing service through two small traits:
//! a [`Connector`] that establishes the connection, and the
//! [`DisplayTransport`] it yields. Requests are sent with
//! [`DisplayTransport::send`], which returns a [`PendingReply`]; a
//! [`RequestMode`] then decides whether the reply is waited for and inspected
//! ([`Checked`]) or detached ([`Unchecked`]).
//!
//! [`XcbConnector`] is the production implementation, backed by `x11rb`'s
//! XCB connection so the same `xcb_connection_t` can be handed to EGL.

use std::ffi::c_void;

use crate::error::{RequestError, SessionError};
use crate::window::{Geometry, WindowProperty};

mod request;
mod xcb;

pub use request::{Checked, RequestMode, RequestModeKind, Unchecked};
pub use xcb::{XcbConnector, XcbTransport};

/// Server-side window identifier (an XID).
pub type WindowId = u32;

/// Server-side visual identifier.
pub type VisualId = u32;

/// Read-only description of one screen of the display server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    /// Position of this screen in the server's screen list.
    pub index: usize,
    pub root: WindowId,
    pub root_visual: VisualId,
    pub root_depth: u8,
    pub white_pixel: u32,
    pub black_pixel: u32,
    pub width_in_pixels: u16,
    pub height_in_pixels: u16,
}

/// Native handles the GPU stack needs to bind to a session and screen.
#[derive(Debug, Clone, Copy)]
pub struct NativeDisplay {
    /// Raw `xcb_connection_t*` of the session. Null once disconnected.
    pub connection: *mut c_void,
    pub screen: usize,
}

/// A window request understood by the transport.
#[derive(Debug, Clone, Copy)]
pub enum WindowRequest<'a> {
    Create {
        window: WindowId,
        parent: WindowId,
        geometry: Geometry,
        visual: VisualId,
        properties: &'a [WindowProperty],
    },
    Map {
        window: WindowId,
    },
    Destroy {
        window: WindowId,
    },
}

impl WindowRequest<'_> {
    /// Protocol name of the request, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            WindowRequest::Create { .. } => "CreateWindow",
            WindowRequest::Map { .. } => "MapWindow",
            WindowRequest::Destroy { .. } => "DestroyWindow",
        }
    }

    /// The window the request targets.
    pub fn window(&self) -> WindowId {
        match *self {
            WindowRequest::Create { window, .. }
            | WindowRequest::Map { window }
            | WindowRequest::Destroy { window } => window,
        }
    }
}

/// The outstanding acknowledgement of a request that has been sent.
pub trait PendingReply {
    /// Waits for the server to process the request and reports its error reply, if any.
    fn check(self: Box<Self>) -> Result<(), RequestError>;

    /// Gives up on the acknowledgement. Errors, if any, are delivered out of band.
    fn detach(self: Box<Self>);
}

/// Establishes a connection to the display server.
pub trait Connector {
    type Transport: DisplayTransport;

    /// Connects and returns the transport together with the index of the
    /// screen the environment asks for (e.g. the `.N` suffix of `DISPLAY`).
    fn connect(self) -> Result<(Self::Transport, usize), SessionError>;
}

/// An established connection to the display server.
///
/// Implementations are not reentrant and are used from a single thread.
pub trait DisplayTransport {
    /// Screens announced by the server in its connection setup.
    fn screens(&self) -> Vec<ScreenInfo>;

    /// Reserves a fresh resource id from the connection's id space.
    fn generate_id(&self) -> Result<WindowId, SessionError>;

    /// Queues `request` and returns a handle to its acknowledgement.
    fn send<'a>(&'a self, request: WindowRequest<'_>) -> Result<Box<dyn PendingReply + 'a>, RequestError>;

    /// Writes queued requests to the server.
    fn flush(&self) -> Result<(), RequestError>;

    /// Native handles for binding a GPU display to `screen`.
    fn native_display(&self, screen: usize) -> NativeDisplay;

    /// Releases the connection. Must be called at most once.
    fn disconnect(&mut self);
}
