//! # squint-core
//!
//! Domain model for squint, a screen mirror that duplicates one monitor into
//! a window on another.  Typical use: a laptop presenting on a projector,
//! where the presenter watches the projected content on the laptop panel.
//!
//! This crate has zero dependencies on display servers, async runtimes or
//! UI toolkits.  Everything here is plain data plus the policies that act on
//! it, so it can be unit-tested on any machine.
//!
//! # Architecture overview (for beginners)
//!
//! - **`domain::geometry`** – rectangles, points and the "cursor outside"
//!   sentinel.
//! - **`domain::monitor`** – chooses which monitor is mirrored (source) and
//!   which one hosts the mirror (destination).
//! - **`domain::viewport`** – sizes and places the mirror window and pans an
//!   oversized source so the pointer stays visible.
//! - **`domain::refresh`** – polling vs. damage-driven refresh and the
//!   debouncer that rate-limits damage bursts.
//! - **`domain::pointer`** / **`domain::cursor_image`** / **`domain::crosshair`**
//!   – pointer enter/leave tracking, the duplicated cursor bitmap, and the
//!   crosshair drawn when the bitmap is not available.
//! - **`domain::follow`** / **`domain::visibility`** – show or hide the mirror
//!   depending on which monitor the focused window lives on.
//! - **`keymap`** – tells modifier key presses apart from real typing.

pub mod domain;
pub mod keymap;

pub use domain::crosshair::{crosshair, Pen, Stroke};
pub use domain::cursor_image::{CursorImage, CURSOR_SIZE};
pub use domain::follow::ActiveWindowFollower;
pub use domain::geometry::{CursorPosition, Point, Rect, Size};
pub use domain::monitor::{select_monitors, Monitor, MonitorSelection, SelectionError};
pub use domain::pointer::{PointerTracker, PointerTransition};
pub use domain::refresh::{
    Debouncer, RateSettings, RefreshDecision, RefreshMode, RefreshPolicy,
};
pub use domain::viewport::{adjust_offset, initial_window_rect, overlay_origin};
pub use domain::visibility::{VisibilityCommand, VisibilityState};
pub use keymap::{is_modifier_keysym, KeyboardMapping};
