//! Active-window follow: hide the mirror when the focused window lives on
//! the destination monitor, show it when the focused window lives on the
//! source.
//!
//! Whichever side holds more of the focused window wins.  Ties hide the
//! mirror.  A focused window that exactly covers the root window is usually
//! the desktop itself and is ignored.  This equality test is a heuristic and
//! only matches exactly.

use super::geometry::Rect;
use super::visibility::VisibilityCommand;

#[derive(Debug, Clone)]
pub struct ActiveWindowFollower {
    source: Rect,
    destination: Rect,
    root: Rect,
}

impl ActiveWindowFollower {
    pub fn new(source: Rect, destination: Rect, root: Rect) -> Self {
        Self {
            source,
            destination,
            root,
        }
    }

    /// Handles the geometry of a newly focused top-level window.
    ///
    /// `None` means the geometry could not be queried (the window may
    /// already be gone); the update is skipped.
    pub fn on_active_window_geometry(&self, geometry: Option<Rect>) -> Option<VisibilityCommand> {
        let rect = geometry?;
        if rect == self.root {
            return None;
        }
        Some(self.decide(&rect))
    }

    fn decide(&self, active: &Rect) -> VisibilityCommand {
        let on_source = active.intersection_area(&self.source);
        let on_destination = active.intersection_area(&self.destination);
        if on_source > on_destination {
            VisibilityCommand::Show
        } else {
            VisibilityCommand::Hide
        }
    }
}
