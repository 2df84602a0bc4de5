//! Events consumed by the mirror session.
//!
//! Display backends, timers and signal handlers all translate whatever they
//! observe into a [`MirrorEvent`] and post it on one channel.  The control
//! loop drains that channel and hands each event to
//! [`MirrorSession::handle`](super::session::MirrorSession::handle), which
//! has exactly one handler per variant.
//!
//! Timestamps are display-server milliseconds.  They share one clock across
//! pointer, button and damage events but may wrap; the debouncer copes with
//! that.

use squint_core::Rect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    /// The pointer moved somewhere on the desktop (raw motion).
    PointerMoved { time_ms: u64 },
    /// A key was pressed anywhere; `keysym` is its unshifted KeySym, or zero
    /// when the keycode has no binding.
    KeyPressed { keysym: u32 },
    /// The focused top-level window changed.
    ActiveWindowChanged,
    /// The hosting window was moved or resized (global coordinates).
    WindowConfigured { rect: Rect },
    /// A pointer button was pressed on the hosting window.
    ButtonPressed { time_ms: u64 },
    /// An output was added, removed or resized.
    TopologyChanged,
    /// Part of the desktop changed.
    Damage { time_ms: u64, area: Rect },
    /// The cursor bitmap changed.
    CursorShapeChanged,
    /// The periodic refresh timer fired.
    Tick,
    /// A deferred damage capture fired.
    DeferredCapture { token: u64 },
    /// Enable when disabled, disable when enabled.
    ToggleRequested,
    EnableRequested,
    DisableRequested,
}
