//! Recording display backend for tests.
//!
//! [`MockDisplay`] answers probe queries from plain public fields and appends
//! every side-effecting call to [`MockDisplay::calls`], so tests can assert on
//! the exact order in which a session touches the display.

use squint_core::{CursorImage, Monitor, Point, Rect, Stroke};

use super::{
    Capabilities, CursorOverlay, DisplayError, DisplayProbe, EventFeeds, MirrorSurface,
    SurfaceSpec, WindowId,
};

/// One side-effecting call made against a [`MockDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    CreateSurface(SurfaceSpec),
    DestroySurface,
    SetWindowGeometry(Rect),
    PlaceView(Point),
    Raise { fullscreen: bool },
    Lower { fullscreen: bool },
    Capture(Rect),
    DrawStrokes(Vec<Stroke>),
    Invalidate,
    CreateOverlay,
    DestroyOverlay,
    UploadCursorImage,
    MoveOverlay(Point),
    SetOverlayMapped(bool),
    StartFocusTracking,
    StopFocusTracking,
    StartPointerTracking,
    StopPointerTracking,
    StartDamage(Rect),
    StopDamage,
}

/// A scriptable, recording implementation of every display port.
#[derive(Debug, Clone)]
pub struct MockDisplay {
    pub capabilities: Capabilities,
    pub monitors: Vec<Monitor>,
    pub root: Rect,
    pub pointer: Point,
    pub active_window: Option<WindowId>,
    /// Geometry returned for the active window; `None` simulates a window
    /// that disappeared mid-query.
    pub active_geometry: Option<Rect>,
    pub fail_surface: bool,
    pub fail_focus: bool,
    pub fail_overlay: bool,
    pub calls: Vec<DisplayCall>,
    surface: bool,
    overlay: bool,
}

impl MockDisplay {
    /// A 1920×1080 laptop panel at the origin and an 800×600 projector to its
    /// right, with every capability available.
    pub fn laptop_and_projector() -> Self {
        Self::with_monitors(vec![
            Monitor::new("eDP-1", Rect::new(0, 0, 1920, 1080)),
            Monitor::new("VGA-1", Rect::new(1920, 0, 800, 600)),
        ])
    }

    pub fn with_monitors(monitors: Vec<Monitor>) -> Self {
        let right = monitors.iter().map(|m| m.rect.right()).max().unwrap_or(0);
        let bottom = monitors.iter().map(|m| m.rect.bottom()).max().unwrap_or(0);
        Self {
            capabilities: Capabilities::all(),
            monitors,
            root: Rect::new(0, 0, right, bottom),
            pointer: Point::new(-1, -1),
            active_window: None,
            active_geometry: None,
            fail_surface: false,
            fail_focus: false,
            fail_overlay: false,
            calls: Vec::new(),
            surface: false,
            overlay: false,
        }
    }

    pub fn has_surface(&self) -> bool {
        self.surface
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &DisplayCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    /// Number of recorded captures, regardless of region.
    pub fn capture_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DisplayCall::Capture(_)))
            .count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl DisplayProbe for MockDisplay {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn monitors(&self) -> Result<Vec<Monitor>, DisplayError> {
        Ok(self.monitors.clone())
    }

    fn root_rect(&self) -> Rect {
        self.root
    }

    fn query_pointer(&self) -> Result<Point, DisplayError> {
        Ok(self.pointer)
    }

    fn active_window(&self) -> Option<WindowId> {
        self.active_window
    }

    fn top_level_geometry(&self, _window: WindowId) -> Option<Rect> {
        self.active_geometry
    }
}

impl MirrorSurface for MockDisplay {
    fn create_surface(&mut self, spec: &SurfaceSpec) -> Result<(), DisplayError> {
        if self.fail_surface {
            return Err(DisplayError::Platform("injected surface failure".to_string()));
        }
        self.surface = true;
        self.calls.push(DisplayCall::CreateSurface(*spec));
        Ok(())
    }

    fn destroy_surface(&mut self) {
        self.surface = false;
        self.calls.push(DisplayCall::DestroySurface);
    }

    fn set_window_geometry(&mut self, rect: Rect) -> Result<(), DisplayError> {
        if !self.surface {
            return Err(DisplayError::SurfaceMissing);
        }
        self.calls.push(DisplayCall::SetWindowGeometry(rect));
        Ok(())
    }

    fn place_view(&mut self, offset: Point) {
        self.calls.push(DisplayCall::PlaceView(offset));
    }

    fn raise(&mut self, fullscreen: bool) {
        self.calls.push(DisplayCall::Raise { fullscreen });
    }

    fn lower(&mut self, fullscreen: bool) {
        self.calls.push(DisplayCall::Lower { fullscreen });
    }

    fn capture(&mut self, source: Rect) -> Result<(), DisplayError> {
        if !self.surface {
            return Err(DisplayError::SurfaceMissing);
        }
        self.calls.push(DisplayCall::Capture(source));
        Ok(())
    }

    fn draw_strokes(&mut self, strokes: &[Stroke]) {
        self.calls.push(DisplayCall::DrawStrokes(strokes.to_vec()));
    }

    fn invalidate(&mut self) {
        self.calls.push(DisplayCall::Invalidate);
    }
}

impl CursorOverlay for MockDisplay {
    fn create_overlay(&mut self) -> Result<(), DisplayError> {
        if !self.surface {
            return Err(DisplayError::SurfaceMissing);
        }
        if self.fail_overlay {
            return Err(DisplayError::Platform("injected overlay failure".to_string()));
        }
        self.overlay = true;
        self.calls.push(DisplayCall::CreateOverlay);
        Ok(())
    }

    fn destroy_overlay(&mut self) {
        self.overlay = false;
        self.calls.push(DisplayCall::DestroyOverlay);
    }

    fn fetch_cursor_image(&self) -> Result<CursorImage, DisplayError> {
        // A 2×2 arrow-ish cursor with the hotspot at the top-left corner.
        CursorImage::from_argb(2, 2, Point::new(0, 0), &[0xff00_0000; 4])
            .ok_or_else(|| DisplayError::Platform("bad cursor image".to_string()))
    }

    fn upload_cursor_image(&mut self, _image: &CursorImage) -> Result<(), DisplayError> {
        self.calls.push(DisplayCall::UploadCursorImage);
        Ok(())
    }

    fn move_overlay(&mut self, at: Point) {
        self.calls.push(DisplayCall::MoveOverlay(at));
    }

    fn set_overlay_mapped(&mut self, mapped: bool) {
        self.calls.push(DisplayCall::SetOverlayMapped(mapped));
    }
}

impl EventFeeds for MockDisplay {
    fn start_focus_tracking(&mut self) -> Result<(), DisplayError> {
        if self.fail_focus {
            return Err(DisplayError::Platform("injected focus failure".to_string()));
        }
        self.calls.push(DisplayCall::StartFocusTracking);
        Ok(())
    }

    fn stop_focus_tracking(&mut self) {
        self.calls.push(DisplayCall::StopFocusTracking);
    }

    fn start_pointer_tracking(&mut self) -> Result<(), DisplayError> {
        if !self.capabilities.raw_pointer {
            return Err(DisplayError::Unsupported("XInput 2.2"));
        }
        self.calls.push(DisplayCall::StartPointerTracking);
        Ok(())
    }

    fn stop_pointer_tracking(&mut self) {
        self.calls.push(DisplayCall::StopPointerTracking);
    }

    fn start_damage(&mut self, source: Rect) -> Result<(), DisplayError> {
        if !self.capabilities.damage {
            return Err(DisplayError::Unsupported("DAMAGE"));
        }
        self.calls.push(DisplayCall::StartDamage(source));
        Ok(())
    }

    fn stop_damage(&mut self) {
        self.calls.push(DisplayCall::StopDamage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_display_records_calls_in_order() {
        // Arrange
        let mut display = MockDisplay::laptop_and_projector();
        let spec = SurfaceSpec {
            window: Rect::new(1920, 0, 800, 600),
            source: Rect::new(0, 0, 1920, 1080),
            fullscreen: true,
        };

        // Act
        display.create_surface(&spec).expect("surface");
        display.capture(spec.source).expect("capture");
        display.destroy_surface();

        // Assert
        assert_eq!(
            display.calls,
            vec![
                DisplayCall::CreateSurface(spec),
                DisplayCall::Capture(spec.source),
                DisplayCall::DestroySurface,
            ]
        );
        assert!(!display.has_surface());
    }

    #[test]
    fn test_mock_display_root_spans_all_monitors() {
        let display = MockDisplay::laptop_and_projector();
        assert_eq!(display.root_rect(), Rect::new(0, 0, 2720, 1080));
    }

    #[test]
    fn test_mock_display_capture_without_surface_fails() {
        let mut display = MockDisplay::laptop_and_projector();
        assert!(matches!(
            display.capture(Rect::new(0, 0, 1, 1)),
            Err(DisplayError::SurfaceMissing)
        ));
    }
}
