//! The display-server session.

use tracing::{debug, info, warn};

use crate::display::{Connector, DisplayTransport, NativeDisplay, RequestMode, ScreenInfo, WindowId, WindowRequest};
use crate::error::{RequestError, SessionError};

/// A live connection to the display server, bound to one screen.
///
/// Windows borrow the session, so [`Session::close`] can only be called once
/// every window created on it is gone. `close` consumes the session, which
/// makes a second disconnect impossible.
#[derive(Debug)]
pub struct Session<T: DisplayTransport> {
    transport: T,
    screens: Vec<ScreenInfo>,
    screen_index: usize,
    live: bool,
}

impl<T: DisplayTransport> Session<T> {
    /// Connects through `connector` and selects a screen.
    ///
    /// `screen` overrides the screen the environment asks for.
    ///
    /// # Errors
    ///
    /// [`SessionError::Connection`] if the connection fails or the server
    /// announces no screens, [`SessionError::ScreenUnavailable`] if the
    /// selected screen does not exist. The connection is released before
    /// either error is returned.
    pub fn open<C>(connector: C, screen: Option<usize>) -> Result<Self, SessionError>
    where
        C: Connector<Transport = T>,
    {
        let (mut transport, preferred) = connector.connect()?;
        let screens = transport.screens();
        let screen_index = screen.unwrap_or(preferred);

        if screens.is_empty() {
            transport.disconnect();
            return Err(SessionError::Connection("display server reported no screens".to_string()));
        }
        if screen_index >= screens.len() {
            transport.disconnect();
            return Err(SessionError::ScreenUnavailable { requested: screen_index, available: screens.len() });
        }

        let selected = &screens[screen_index];
        info!(
            "Session opened on screen {} of {} ({}x{}, root {:#x}, visual {:#x}, depth {}).",
            screen_index,
            screens.len(),
            selected.width_in_pixels,
            selected.height_in_pixels,
            selected.root,
            selected.root_visual,
            selected.root_depth
        );

        Ok(Self { transport, screens, screen_index, live: true })
    }

    /// The selected screen.
    pub fn screen(&self) -> &ScreenInfo {
        &self.screens[self.screen_index]
    }

    pub fn screens(&self) -> &[ScreenInfo] {
        &self.screens
    }

    pub fn screen_index(&self) -> usize {
        self.screen_index
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Reserves an identifier from the session's id space.
    pub fn allocate_id(&self) -> Result<WindowId, SessionError> {
        let id = self.transport.generate_id()?;
        debug!("Allocated id {:#x}.", id);
        Ok(id)
    }

    /// Forces queued unchecked requests onto the wire.
    pub fn flush(&self) -> Result<(), RequestError> {
        self.transport.flush()
    }

    /// Native handles for binding the GPU stack to the selected screen.
    pub fn native_display(&self) -> NativeDisplay {
        self.transport.native_display(self.screen_index)
    }

    /// Sends `request` and settles it according to `mode`.
    ///
    /// Unchecked requests are flushed so the server sees them in order.
    pub(crate) fn submit(&self, request: WindowRequest<'_>, mode: &dyn RequestMode) -> Result<(), RequestError> {
        let pending = self.transport.send(request)?;
        mode.settle(pending)?;
        if !mode.is_checked() {
            self.flush()?;
        }
        Ok(())
    }

    /// Releases the connection.
    pub fn close(mut self) {
        self.disconnect();
    }

    fn disconnect(&mut self) {
        if self.live {
            self.live = false;
            self.transport.disconnect();
            info!("Session on screen {} closed.", self.screen_index);
        }
    }
}

impl<T: DisplayTransport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.live {
            warn!("Session dropped without close(); disconnecting.");
            self.disconnect();
        }
    }
}
