//! Display-server ports used by the mirror session.
//!
//! The session never talks to X11 directly.  It sees the display through four
//! narrow traits:
//!
//! | Trait            | Responsibility                                            |
//! |------------------|-----------------------------------------------------------|
//! | [`DisplayProbe`] | read-only queries: capabilities, monitors, pointer, focus |
//! | [`MirrorSurface`]| the hosting window, the view and the captured image       |
//! | [`CursorOverlay`]| the shaped window that shows the duplicated cursor        |
//! | [`EventFeeds`]   | subscribing to focus, raw pointer and damage events       |
//!
//! [`DisplayBackend`] bundles all four and is implemented automatically for
//! any type that implements them.
//!
//! # Capabilities (probe-and-record)
//!
//! Optional server extensions are probed once when the backend connects and
//! stored in [`Capabilities`].  Every code path exists in every build; the
//! session consults the flags at enable time and falls back when a feature is
//! missing (polling instead of damage, crosshair instead of cursor overlay,
//! pointer polling instead of raw motion events).
//!
//! # Platform implementations
//!
//! | Module | OS    | API used                                             |
//! |--------|-------|------------------------------------------------------|
//! | `x11`  | Linux | `x11rb`: RandR, DAMAGE, XFixes, SHAPE, XInput 2.2     |
//!
//! A [`MockDisplay`] is always compiled (not guarded by `#[cfg]`) so tests on
//! any platform can drive a session without a display server.

use squint_core::{CursorImage, Monitor, Point, Rect, Stroke};
use thiserror::Error;

pub mod mock;

pub use mock::{DisplayCall, MockDisplay};

/// Server-side identifier of a window.
pub type WindowId = u32;

/// Error type for display-server operations.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// No display server could be reached.
    #[error("cannot open display: {0}")]
    NoDisplay(String),

    /// A required server feature is missing.
    #[error("display server does not support {0}")]
    Unsupported(&'static str),

    /// The server rejected a request or the connection failed.
    ///
    /// The inner string is the error reported by the protocol library.
    #[error("display server error: {0}")]
    Platform(String),

    /// An operation needed the hosting surface but none exists.
    #[error("mirror surface has not been created")]
    SurfaceMissing,
}

/// Optional features the display server offers, probed once at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Raw pointer-motion and key-press events (XInput 2.2).
    pub raw_pointer: bool,
    /// Cursor shape queries and change notifications (XFixes).
    pub cursor_shape: bool,
    /// Non-rectangular windows (SHAPE 1.1).
    pub window_shape: bool,
    /// Damaged-region notifications (DAMAGE).
    pub damage: bool,
    /// The default visual is 24-bit true colour.
    pub true_color: bool,
}

impl Capabilities {
    /// Everything available.
    pub fn all() -> Self {
        Self {
            raw_pointer: true,
            cursor_shape: true,
            window_shape: true,
            damage: true,
            true_color: true,
        }
    }

    /// Whether the real cursor bitmap can be duplicated.
    pub fn cursor_overlay(&self) -> bool {
        self.true_color && self.cursor_shape && self.window_shape
    }
}

/// Initial description of the hosting surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSpec {
    /// Hosting window geometry in global coordinates.
    pub window: Rect,
    /// Source region; the view and its backing image have this size.
    pub source: Rect,
    /// Whether the window is shown fullscreen.
    pub fullscreen: bool,
}

/// Read-only queries against the display server.
pub trait DisplayProbe {
    fn capabilities(&self) -> Capabilities;

    /// Enumerates the connected outputs, fresh on every call.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Platform`] if the server query fails.
    fn monitors(&self) -> Result<Vec<Monitor>, DisplayError>;

    /// Geometry of the root window (the whole desktop).
    fn root_rect(&self) -> Rect;

    /// Current pointer position in global coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Platform`] if the server query fails.
    fn query_pointer(&self) -> Result<Point, DisplayError>;

    /// The window that currently has input focus, if any.
    fn active_window(&self) -> Option<WindowId>;

    /// Global geometry of `window`'s top-level ancestor.
    ///
    /// Foreign windows may vanish at any moment; any failure is reported as
    /// `None`.
    fn top_level_geometry(&self, window: WindowId) -> Option<Rect>;
}

/// The hosting window, the view inside it, and the captured image.
pub trait MirrorSurface {
    /// Creates (and maps) the hosting window, the view and the backing image.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Platform`] if any resource cannot be created.
    fn create_surface(&mut self, spec: &SurfaceSpec) -> Result<(), DisplayError>;

    /// Releases everything created by [`create_surface`](Self::create_surface).
    /// Does nothing when no surface exists.
    fn destroy_surface(&mut self);

    /// Moves and resizes the hosting window.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::SurfaceMissing`] without a surface.
    fn set_window_geometry(&mut self, rect: Rect) -> Result<(), DisplayError>;

    /// Positions the view at `offset` inside the hosting window.
    fn place_view(&mut self, offset: Point);

    /// Raises the window (and enters fullscreen when requested).
    fn raise(&mut self, fullscreen: bool);

    /// Lowers the window (and leaves fullscreen when requested).
    fn lower(&mut self, fullscreen: bool);

    /// Copies the pixels of `source` into the backing image.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Platform`] if the copy fails.
    fn capture(&mut self, source: Rect) -> Result<(), DisplayError>;

    /// Draws line segments (source-relative coordinates) into the backing image.
    fn draw_strokes(&mut self, strokes: &[Stroke]);

    /// Forces the view to be repainted from the backing image.
    fn invalidate(&mut self);
}

/// The shaped child window that displays the duplicated cursor bitmap.
pub trait CursorOverlay {
    /// Creates the overlay, unmapped, and subscribes to cursor changes.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::SurfaceMissing`] without a hosting surface, or
    /// [`DisplayError::Platform`] if the server rejects a request.
    fn create_overlay(&mut self) -> Result<(), DisplayError>;

    /// Destroys the overlay.  Does nothing when no overlay exists.
    fn destroy_overlay(&mut self);

    /// Reads the current cursor bitmap from the server.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Platform`] if the query fails.
    fn fetch_cursor_image(&self) -> Result<CursorImage, DisplayError>;

    /// Uploads `image` into the overlay and applies its shape mask.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Platform`] if the upload fails.
    fn upload_cursor_image(&mut self, image: &CursorImage) -> Result<(), DisplayError>;

    /// Moves the overlay to `at` (hosting-window coordinates).
    fn move_overlay(&mut self, at: Point);

    fn set_overlay_mapped(&mut self, mapped: bool);
}

/// Subscriptions that make the backend emit session events.
pub trait EventFeeds {
    /// Starts reporting focus changes.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Platform`] if the subscription fails.
    fn start_focus_tracking(&mut self) -> Result<(), DisplayError>;
    fn stop_focus_tracking(&mut self);

    /// Starts reporting raw pointer motion and key presses.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Unsupported`] without XInput 2.2.
    fn start_pointer_tracking(&mut self) -> Result<(), DisplayError>;
    fn stop_pointer_tracking(&mut self);

    /// Starts reporting damaged regions of the desktop.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Unsupported`] without DAMAGE.
    fn start_damage(&mut self, source: Rect) -> Result<(), DisplayError>;
    fn stop_damage(&mut self);
}

/// Everything a mirror session needs from the display server.
pub trait DisplayBackend: DisplayProbe + MirrorSurface + CursorOverlay + EventFeeds {}

impl<T> DisplayBackend for T where T: DisplayProbe + MirrorSurface + CursorOverlay + EventFeeds {}

// ── Linux implementation ──────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
pub mod x11;

/// Re-export the X11 backend as `NativeDisplay` on Linux.
#[cfg(target_os = "linux")]
pub use x11::X11Display as NativeDisplay;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_overlay_requires_all_three_capabilities() {
        let mut caps = Capabilities::all();
        assert!(caps.cursor_overlay());

        caps.window_shape = false;
        assert!(!caps.cursor_overlay());

        let caps = Capabilities {
            true_color: false,
            ..Capabilities::all()
        };
        assert!(!caps.cursor_overlay());
    }

    #[test]
    fn test_default_capabilities_are_all_absent() {
        let caps = Capabilities::default();
        assert!(!caps.raw_pointer && !caps.damage && !caps.cursor_overlay());
    }
}
