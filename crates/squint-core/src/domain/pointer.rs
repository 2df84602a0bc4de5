//! Pointer tracking against the source region.
//!
//! The tracker turns raw global pointer positions into region-relative
//! [`CursorPosition`]s and reports enter/leave transitions.  Entering the
//! source raises the mirror; leaving it lowers the mirror.

use super::geometry::{CursorPosition, Point, Rect};

/// Result of feeding one pointer position to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerTransition {
    pub entered: bool,
    pub left: bool,
    /// The region-relative position changed (including to/from `Outside`).
    pub moved: bool,
}

#[derive(Debug, Clone)]
pub struct PointerTracker {
    region: Rect,
    last: CursorPosition,
}

impl PointerTracker {
    pub fn new(region: Rect) -> Self {
        Self {
            region,
            last: CursorPosition::Outside,
        }
    }

    /// Last known position relative to the source region.
    pub fn position(&self) -> CursorPosition {
        self.last
    }

    /// Feeds a raw global pointer position.
    ///
    /// With `force` set (right after enabling) `entered`/`left` describe the
    /// new position alone instead of a transition from the previous one, so
    /// the caller always gets a visibility decision.
    pub fn on_pointer_moved(&mut self, raw: Point, force: bool) -> PointerTransition {
        let now = CursorPosition::locate(&self.region, raw);
        let moved = now != self.last;
        let was_inside = self.last.is_inside();
        self.last = now;

        if force {
            return PointerTransition {
                entered: now.is_inside(),
                left: !now.is_inside(),
                moved,
            };
        }

        PointerTransition {
            entered: !was_inside && now.is_inside(),
            left: was_inside && !now.is_inside(),
            moved,
        }
    }
}
