use std::ffi::{c_void, CString};
use std::ptr;

use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::cookie::VoidCookie;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{ConnectionExt as _, CreateWindowAux, WindowClass};
use x11rb::xcb_ffi::XCBConnection;

use super::{Connector, DisplayTransport, NativeDisplay, PendingReply, ScreenInfo, WindowId, WindowRequest};
use crate::error::{RequestError, ServerRejection, SessionError};
use crate::window::WindowProperty;

/// Connects to an X server through libxcb.
#[derive(Debug, Clone, Default)]
pub struct XcbConnector {
    display: Option<String>,
}

impl XcbConnector {
    /// Connector for `display`, or for `$DISPLAY` when `None`.
    pub fn new(display: Option<String>) -> Self {
        Self { display }
    }
}

impl Connector for XcbConnector {
    type Transport = XcbTransport;

    fn connect(self) -> Result<(XcbTransport, usize), SessionError> {
        let name = self
            .display
            .map(CString::new)
            .transpose()
            .map_err(|e| SessionError::Connection(format!("invalid display name: {e}")))?;

        let (conn, preferred_screen) = XCBConnection::connect(name.as_deref())
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        info!(
            "Connected to X server (protocol {}.{}, vendor {:?}).",
            conn.setup().protocol_major_version,
            conn.setup().protocol_minor_version,
            String::from_utf8_lossy(&conn.setup().vendor)
        );

        Ok((XcbTransport { conn: Some(conn) }, preferred_screen))
    }
}

/// [`DisplayTransport`] over an `x11rb` XCB connection.
pub struct XcbTransport {
    conn: Option<XCBConnection>,
}

impl std::fmt::Debug for XcbTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XcbTransport")
            .field("connected", &self.conn.is_some())
            .finish()
    }
}

impl XcbTransport {
    fn conn(&self) -> Result<&XCBConnection, RequestError> {
        self.conn
            .as_ref()
            .ok_or_else(|| RequestError::Transport("connection already closed".to_string()))
    }
}

impl DisplayTransport for XcbTransport {
    fn screens(&self) -> Vec<ScreenInfo> {
        let Some(conn) = &self.conn else {
            return Vec::new();
        };
        conn.setup()
            .roots
            .iter()
            .enumerate()
            .map(|(index, screen)| ScreenInfo {
                index,
                root: screen.root,
                root_visual: screen.root_visual,
                root_depth: screen.root_depth,
                white_pixel: screen.white_pixel,
                black_pixel: screen.black_pixel,
                width_in_pixels: screen.width_in_pixels,
                height_in_pixels: screen.height_in_pixels,
            })
            .collect()
    }

    fn generate_id(&self) -> Result<WindowId, SessionError> {
        let conn = self.conn().map_err(|e| SessionError::IdAllocation(e.to_string()))?;
        conn.generate_id().map_err(|e| SessionError::IdAllocation(e.to_string()))
    }

    fn send<'a>(&'a self, request: WindowRequest<'_>) -> Result<Box<dyn PendingReply + 'a>, RequestError> {
        let conn = self.conn()?;
        let cookie = match request {
            WindowRequest::Create { window, parent, geometry, visual, properties } => {
                let aux = properties.iter().fold(CreateWindowAux::new(), |aux, property| match *property {
                    WindowProperty::BackgroundPixel(pixel) => aux.background_pixel(pixel),
                    WindowProperty::BorderPixel(pixel) => aux.border_pixel(pixel),
                    WindowProperty::OverrideRedirect(enabled) => aux.override_redirect(u32::from(enabled)),
                });
                conn.create_window(
                    x11rb::COPY_DEPTH_FROM_PARENT,
                    window,
                    parent,
                    geometry.x,
                    geometry.y,
                    geometry.width,
                    geometry.height,
                    geometry.border_width,
                    WindowClass::INPUT_OUTPUT,
                    visual,
                    &aux,
                )
            }
            WindowRequest::Map { window } => conn.map_window(window),
            WindowRequest::Destroy { window } => conn.destroy_window(window),
        }
        .map_err(|e| RequestError::Transport(e.to_string()))?;

        debug!(
            "Sent {} for window {:#x} (sequence {}).",
            request.name(),
            request.window(),
            cookie.sequence_number()
        );
        Ok(Box::new(XcbPending { cookie }))
    }

    fn flush(&self) -> Result<(), RequestError> {
        self.conn()?
            .flush()
            .map_err(|e| RequestError::Transport(e.to_string()))
    }

    fn native_display(&self, screen: usize) -> NativeDisplay {
        let connection = match &self.conn {
            Some(conn) => conn.get_raw_xcb_connection(),
            None => ptr::null_mut::<c_void>(),
        };
        NativeDisplay { connection, screen }
    }

    fn disconnect(&mut self) {
        if self.conn.take().is_some() {
            info!("X server connection closed.");
        }
    }
}

struct XcbPending<'a> {
    cookie: VoidCookie<'a, XCBConnection>,
}

impl PendingReply for XcbPending<'_> {
    fn check(self: Box<Self>) -> Result<(), RequestError> {
        let XcbPending { cookie } = *self;
        cookie.check().map_err(reply_error)
    }

    fn detach(self: Box<Self>) {
        // Dropping a void cookie leaves any error reply in the event queue.
        let XcbPending { cookie } = *self;
        drop(cookie);
    }
}

fn reply_error(err: ReplyError) -> RequestError {
    match err {
        ReplyError::X11Error(x11) => RequestError::Rejected(ServerRejection {
            error_code: x11.error_code,
            kind: format!("{:?}", x11.error_kind),
            bad_value: x11.bad_value,
            sequence: x11.sequence,
        }),
        ReplyError::ConnectionError(e) => RequestError::Transport(e.to_string()),
    }
}
