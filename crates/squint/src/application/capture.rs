//! The capture action and the refresh-timer decision.

use squint_core::{crosshair, CursorPosition, Rect, RefreshMode, RefreshPolicy};

use crate::infrastructure::display::{DisplayError, MirrorSurface};

/// Snapshots `source` into the backing image, draws the crosshair when the
/// real cursor is not duplicated and the pointer is over the source, then
/// invalidates the view.
///
/// # Errors
///
/// Propagates the surface's capture error; nothing is drawn in that case.
pub fn capture_frame<S>(
    surface: &mut S,
    source: Rect,
    cursor: CursorPosition,
    cursor_overlay: bool,
) -> Result<(), DisplayError>
where
    S: MirrorSurface + ?Sized,
{
    surface.capture(source)?;
    if !cursor_overlay {
        if let Some(at) = cursor.point() {
            surface.draw_strokes(&crosshair(at));
        }
    }
    surface.invalidate();
    Ok(())
}

/// Whether the session needs the periodic timer.
///
/// Polling mode always does.  In damage-driven mode the timer is only needed
/// to poll the pointer when raw pointer events are unavailable.
pub fn needs_periodic_timer(policy: &RefreshPolicy, pointer_tracked: bool) -> bool {
    policy.mode == RefreshMode::Polling || !pointer_tracked
}
