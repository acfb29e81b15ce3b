//! Window lifecycle management.
//!
//! A [`Window`] is created on a [`Session`], mapped, and finally destroyed.
//! Each operation takes a [`RequestMode`] that decides whether the request is
//! acknowledged synchronously. The window borrows its session, so the session
//! cannot be closed while the window is alive; a window dropped without
//! [`Window::destroy`] is destroyed best-effort with an unchecked request.

use std::fmt;

use tracing::{debug, info, warn};

use crate::display::{DisplayTransport, RequestMode, ScreenInfo, Unchecked, VisualId, WindowId, WindowRequest};
use crate::error::{RequestError, WindowError};
use crate::session::Session;

/// Position, size and border of a window, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
}

impl Geometry {
    pub fn new(x: i16, y: i16, width: u16, height: u16, border_width: u16) -> Self {
        Self { x, y, width, height, border_width }
    }

    /// Checks the geometry against what the X server accepts.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.width == 0 || self.height == 0 {
            return Err(RequestError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Window attribute set at creation time instead of the server default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowProperty {
    BackgroundPixel(u32),
    BorderPixel(u32),
    OverrideRedirect(bool),
}

/// Lifecycle state of a [`Window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Id reserved, no server-side object yet.
    Allocated,
    Created,
    Mapped,
    Destroyed,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowState::Allocated => "allocated",
            WindowState::Created => "created",
            WindowState::Mapped => "mapped",
            WindowState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// A top-level window leased from a [`Session`].
pub struct Window<'s, T: DisplayTransport> {
    session: &'s Session<T>,
    id: WindowId,
    parent: WindowId,
    visual: VisualId,
    geometry: Geometry,
    state: WindowState,
}

impl<T: DisplayTransport> fmt::Debug for Window<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("visual", &self.visual)
            .field("geometry", &self.geometry)
            .field("state", &self.state)
            .finish()
    }
}

impl<'s, T: DisplayTransport> Window<'s, T> {
    /// Creates a window parented to the root of `screen`, using the screen's
    /// root visual and the given property overrides.
    ///
    /// # Errors
    ///
    /// [`WindowError::Session`] if no window id can be allocated.
    /// [`WindowError::Creation`] if the geometry is invalid or, in checked
    /// mode, the server rejects the request.
    pub fn create(
        session: &'s Session<T>,
        screen: &ScreenInfo,
        geometry: Geometry,
        overrides: &[WindowProperty],
        mode: &dyn RequestMode,
    ) -> Result<Self, WindowError> {
        geometry.validate().map_err(WindowError::Creation)?;

        let id = session.allocate_id()?;
        let mut window = Window {
            session,
            id,
            parent: screen.root,
            visual: screen.root_visual,
            geometry,
            state: WindowState::Allocated,
        };

        let request = WindowRequest::Create {
            window: id,
            parent: window.parent,
            geometry,
            visual: window.visual,
            properties: overrides,
        };
        session.submit(request, mode).map_err(WindowError::Creation)?;
        window.state = WindowState::Created;

        info!(
            "Window {:#x} created at ({}, {}) size {}x{} border {} on screen {} ({} mode).",
            id,
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height,
            geometry.border_width,
            screen.index,
            mode_name(mode)
        );
        Ok(window)
    }

    /// Requests that the window become visible.
    pub fn map(&mut self, mode: &dyn RequestMode) -> Result<(), WindowError> {
        if self.state != WindowState::Created {
            return Err(WindowError::Map {
                window: self.id,
                source: RequestError::Invalid(format!("window is {}, expected created", self.state)),
            });
        }

        self.session
            .submit(WindowRequest::Map { window: self.id }, mode)
            .map_err(|source| WindowError::Map { window: self.id, source })?;
        self.state = WindowState::Mapped;
        info!("Window {:#x} mapped ({} mode).", self.id, mode_name(mode));
        Ok(())
    }

    /// Destroys the window. This is the last request issued against it.
    ///
    /// In unchecked mode a failure cannot be observed and `Ok` is returned.
    pub fn destroy(mut self, mode: &dyn RequestMode) -> Result<(), WindowError> {
        let result = self.release(mode);
        self.state = WindowState::Destroyed;
        result.map_err(|source| WindowError::Destroy { window: self.id, source })?;
        info!("Window {:#x} destroyed ({} mode).", self.id, mode_name(mode));
        Ok(())
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    /// The session the window was created on.
    pub fn session(&self) -> &'s Session<T> {
        self.session
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn visual(&self) -> VisualId {
        self.visual
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    fn release(&self, mode: &dyn RequestMode) -> Result<(), RequestError> {
        match self.state {
            WindowState::Created | WindowState::Mapped => {
                self.session.submit(WindowRequest::Destroy { window: self.id }, mode)
            }
            // Nothing exists server-side.
            WindowState::Allocated | WindowState::Destroyed => Ok(()),
        }
    }
}

impl<T: DisplayTransport> Drop for Window<'_, T> {
    fn drop(&mut self) {
        if matches!(self.state, WindowState::Created | WindowState::Mapped) {
            warn!("Window {:#x} dropped while {}; destroying it unchecked.", self.id, self.state);
            if let Err(e) = self.release(&Unchecked) {
                debug!("Best-effort destroy of window {:#x} failed: {}", self.id, e);
            }
            self.state = WindowState::Destroyed;
        }
    }
}

fn mode_name(mode: &dyn RequestMode) -> &'static str {
    if mode.is_checked() {
        "checked"
    } else {
        "unchecked"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Checked, Unchecked};
    use crate::error::SessionError;
    use crate::testing::{Call, FakeConnector, RequestKind};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn full_hd() -> Geometry {
        Geometry::new(0, 0, 1920, 1080, 1)
    }

    #[test]
    fn test_checked_create_and_map_succeed() {
        let connector = FakeConnector::new();
        let journal = connector.journal();
        let session = Session::open(connector, None).unwrap();
        let screen = *session.screen();

        let mut window = Window::create(
            &session,
            &screen,
            full_hd(),
            &[WindowProperty::BackgroundPixel(screen.white_pixel)],
            &Checked,
        )
        .unwrap();
        assert_eq!(window.state(), WindowState::Created);
        window.map(&Checked).unwrap();
        assert_eq!(window.state(), WindowState::Mapped);
        let id = window.id();
        window.destroy(&Checked).unwrap();

        assert_eq!(
            journal.requests(),
            vec![
                Call::Create { window: id, background: Some(screen.white_pixel) },
                Call::Checked(RequestKind::Create),
                Call::Map(id),
                Call::Checked(RequestKind::Map),
                Call::Destroy(id),
                Call::Checked(RequestKind::Destroy),
            ]
        );
    }

    #[test]
    fn test_checked_create_rejection_is_reported() {
        let connector = FakeConnector::new().rejecting(RequestKind::Create);
        let journal = connector.journal();
        let session = Session::open(connector, None).unwrap();
        let screen = *session.screen();

        let err = Window::create(&session, &screen, full_hd(), &[], &Checked).unwrap_err();

        assert!(matches!(err, WindowError::Creation(RequestError::Rejected(_))));
        assert!(!journal.contains(|call| matches!(call, Call::Map(_) | Call::Destroy(_))));
    }

    #[test]
    fn test_exhausted_ids_are_a_session_error() {
        let connector = FakeConnector::new().exhausting_ids();
        let journal = connector.journal();
        let session = Session::open(connector, None).unwrap();
        let screen = *session.screen();

        let err = Window::create(&session, &screen, full_hd(), &[], &Checked).unwrap_err();

        assert!(matches!(err, WindowError::Session(SessionError::IdAllocation(_))));
        assert_eq!(err.stage(), "connection");
        assert!(journal.requests().is_empty());
    }

    #[test]
    fn test_unchecked_create_rejection_is_not_surfaced() {
        let connector = FakeConnector::new().rejecting(RequestKind::Create);
        let journal = connector.journal();
        let session = Session::open(connector, None).unwrap();
        let screen = *session.screen();

        let mut window = Window::create(&session, &screen, full_hd(), &[], &Unchecked).unwrap();
        window.map(&Unchecked).unwrap();

        assert!(journal.contains(|call| *call == Call::Detached(RequestKind::Create)));
        assert!(journal.contains(|call| *call == Call::Map(window.id())));
        assert!(journal.contains(|call| *call == Call::Flush));
    }

    #[rstest]
    #[case(0, 1080)]
    #[case(1920, 0)]
    fn test_zero_sized_geometry_is_refused_locally(#[case] width: u16, #[case] height: u16) {
        let connector = FakeConnector::new();
        let journal = connector.journal();
        let session = Session::open(connector, None).unwrap();
        let screen = *session.screen();

        let err = Window::create(&session, &screen, Geometry::new(0, 0, width, height, 1), &[], &Checked)
            .unwrap_err();

        assert!(matches!(err, WindowError::Creation(RequestError::Invalid(_))));
        assert!(!journal.contains(|call| matches!(call, Call::Create { .. })));
    }

    #[test]
    fn test_map_twice_is_refused() {
        let session = Session::open(FakeConnector::new(), None).unwrap();
        let screen = *session.screen();
        let mut window = Window::create(&session, &screen, full_hd(), &[], &Checked).unwrap();
        window.map(&Checked).unwrap();

        let err = window.map(&Checked).unwrap_err();
        assert!(matches!(err, WindowError::Map { source: RequestError::Invalid(_), .. }));
    }

    #[test]
    fn test_checked_destroy_rejection_is_reported() {
        let connector = FakeConnector::new().rejecting(RequestKind::Destroy);
        let journal = connector.journal();
        let session = Session::open(connector, None).unwrap();
        let screen = *session.screen();
        let window = Window::create(&session, &screen, full_hd(), &[], &Checked).unwrap();

        let err = window.destroy(&Checked).unwrap_err();

        assert_eq!(err.stage(), "window destroy");
        // No second, best-effort destroy from Drop.
        assert_eq!(journal.count(|call| matches!(call, Call::Destroy(_))), 1);
    }

    #[rstest]
    #[case::checked(&Checked)]
    #[case::unchecked(&Unchecked)]
    fn test_dropped_window_is_destroyed_unchecked(#[case] mode: &dyn RequestMode) {
        let connector = FakeConnector::new();
        let journal = connector.journal();
        let session = Session::open(connector, None).unwrap();
        let screen = *session.screen();

        let window = Window::create(&session, &screen, full_hd(), &[], mode).unwrap();
        let id = window.id();
        drop(window);

        assert!(journal.contains(|call| *call == Call::Destroy(id)));
        assert!(journal.contains(|call| *call == Call::Detached(RequestKind::Destroy)));
    }
}
