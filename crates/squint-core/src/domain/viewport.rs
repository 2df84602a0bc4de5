//! Viewport geometry: where the mirror window goes and which part of the
//! source it shows.
//!
//! The mirrored image is drawn into a "view" surface exactly as large as the
//! source region.  The view sits inside the hosting window at `offset`:
//!
//! ```text
//!   hosting window (window_size)
//!  ┌──────────────────────────┐
//!  │  offset                  │
//!  │   ┌──────────────────────┼─────┐
//!  │   │ view (source_size)   │     │   ← clipped by the window
//!  │   │                      │     │
//!  └───┼──────────────────────┘     │
//!      └────────────────────────────┘
//! ```
//!
//! When the window is at least as large as the source the view is centred
//! statically.  Otherwise the view is panned so the pointer stays visible,
//! moving only as much as needed so motion looks continuous.

use super::geometry::{CursorPosition, Point, Rect, Size};

/// Space left free around a windowed (non-fullscreen) mirror on each axis.
pub const WINDOW_MARGIN: i32 = 100;

/// Adjusts one axis of the view offset.
///
/// `cursor` is the region-relative pointer coordinate on this axis, or `None`
/// when the pointer is outside the source region.
pub fn adjust_axis(offset: i32, source_len: i32, window_len: i32, cursor: Option<i32>) -> i32 {
    if window_len >= source_len {
        return (window_len - source_len) / 2;
    }

    match cursor {
        Some(c) => {
            let v = c + offset;
            if v < 0 {
                offset - v
            } else if v >= window_len {
                offset - (v - window_len + 1)
            } else {
                offset
            }
        }
        // Idle: keep the offset but never expose anything past either end.
        None => offset.clamp(window_len - source_len, 0),
    }
}

/// Computes the new view offset for both axes independently.
pub fn adjust_offset(
    offset: Point,
    source: Size,
    window: Size,
    cursor: CursorPosition,
) -> Point {
    let c = cursor.point();
    Point::new(
        adjust_axis(offset.x, source.width, window.width, c.map(|p| p.x)),
        adjust_axis(offset.y, source.height, window.height, c.map(|p| p.y)),
    )
}

/// Where to overlay the cursor image inside the hosting window.
pub fn overlay_origin(cursor: Point, hotspot: Point, offset: Point) -> Point {
    cursor.minus(hotspot).offset_by(offset)
}

/// Geometry of the hosting window when a session starts (and after a
/// double-click restore).
///
/// Fullscreen covers the whole destination monitor.  Windowed mode sizes
/// each axis to `min(source, destination - WINDOW_MARGIN)` (at least one
/// pixel) and centres the window on the destination.
pub fn initial_window_rect(source: Rect, destination: Rect, fullscreen: bool) -> Rect {
    if fullscreen {
        return destination;
    }
    let width = source.width.min(destination.width - WINDOW_MARGIN).max(1);
    let height = source.height.min(destination.height - WINDOW_MARGIN).max(1);
    Rect::new(
        destination.x + (destination.width - width) / 2,
        destination.y + (destination.height - height) / 2,
        width,
        height,
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Static centring ───────────────────────────────────────────────────────

    #[test]
    fn test_adjust_axis_centres_when_window_is_larger() {
        assert_eq!(adjust_axis(0, 800, 1000, None), 100);
        assert_eq!(adjust_axis(-37, 800, 1000, Some(5)), 100);
        assert_eq!(adjust_axis(12, 800, 800, Some(799)), 0);
    }

    #[test]
    fn test_adjust_axis_centring_is_idempotent() {
        let once = adjust_axis(0, 1024, 1280, Some(3));
        let twice = adjust_axis(once, 1024, 1280, Some(3));
        assert_eq!(once, twice);
    }

    // ── Panning ───────────────────────────────────────────────────────────────

    #[test]
    fn test_adjust_axis_pans_left_when_cursor_passes_right_edge() {
        // Arrange
        let (offset, source, window, cursor) = (0, 1000, 400, 950);

        // Act
        let new = adjust_axis(offset, source, window, Some(cursor));

        // Assert
        assert_eq!(new, -551);
        assert_eq!(cursor + new, window - 1);
    }

    #[test]
    fn test_adjust_axis_pans_right_when_cursor_passes_left_edge() {
        let new = adjust_axis(-500, 1000, 400, Some(420));
        assert_eq!(new, -420);
        assert_eq!(420 + new, 0);
    }

    #[test]
    fn test_adjust_axis_keeps_offset_when_cursor_visible() {
        assert_eq!(adjust_axis(-300, 1000, 400, Some(500)), -300);
    }

    #[test]
    fn test_adjust_axis_outside_clamps_positive_offset_to_zero() {
        assert_eq!(adjust_axis(25, 1000, 400, None), 0);
    }

    #[test]
    fn test_adjust_axis_outside_clamps_to_minimum_offset() {
        assert_eq!(adjust_axis(-900, 1000, 400, None), -600);
        assert_eq!(adjust_axis(-250, 1000, 400, None), -250);
    }

    #[test]
    fn test_adjust_offset_treats_axes_independently() {
        let new = adjust_offset(
            Point::new(0, 0),
            Size::new(1000, 300),
            Size::new(400, 600),
            CursorPosition::Inside(Point::new(950, 10)),
        );
        assert_eq!(new, Point::new(-551, 150));
    }

    // ── Window placement ──────────────────────────────────────────────────────

    #[test]
    fn test_initial_window_rect_fullscreen_covers_destination() {
        let dest = Rect::new(1920, 0, 800, 600);
        assert_eq!(initial_window_rect(Rect::new(0, 0, 1920, 1080), dest, true), dest);
    }

    #[test]
    fn test_initial_window_rect_windowed_applies_margin_and_centres() {
        let r = initial_window_rect(
            Rect::new(0, 0, 1920, 1080),
            Rect::new(1920, 0, 800, 600),
            false,
        );
        assert_eq!(r, Rect::new(1970, 50, 700, 500));
    }

    #[test]
    fn test_initial_window_rect_windowed_small_source_keeps_source_size() {
        let r = initial_window_rect(
            Rect::new(0, 0, 640, 480),
            Rect::new(640, 0, 1920, 1080),
            false,
        );
        assert_eq!(r, Rect::new(640 + 640, 300, 640, 480));
    }

    #[test]
    fn test_overlay_origin_subtracts_hotspot_and_adds_offset() {
        let p = overlay_origin(Point::new(100, 50), Point::new(4, 4), Point::new(-20, 10));
        assert_eq!(p, Point::new(76, 56));
    }
}
