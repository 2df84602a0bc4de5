//! Behavioural properties of the mirroring policies, exercised through the
//! public `squint_core` API only.
//!
//! # Purpose
//!
//! Unit tests next to each module pin down individual rules.  These tests
//! check the properties that must hold across whole inputs:
//!
//! - Monitor selection never returns the same monitor twice.
//! - Centring is independent of the pointer and idempotent.
//! - Panning always brings the pointer back into the window.
//! - A damage burst collapses into exactly two captures.
//! - Pointer paths produce one transition per boundary crossing.
//! - The standard laptop + projector layout produces the expected window.

use squint_core::{
    adjust_offset, initial_window_rect, select_monitors, CursorPosition, Debouncer, Monitor,
    Point, PointerTracker, Rect, RefreshDecision, SelectionError, Size,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Replays damage timestamps through a debouncer the way the session does
/// and returns the timestamps at which a capture actually ran.
///
/// Every notification is handled before any deferred timer expires; timers
/// still queued afterwards fire in scheduling order.  Cancelled timers are
/// kept in the queue on purpose: their stale token must be dropped.
fn replay_burst(min_period: u64, damage: &[u64]) -> Vec<u64> {
    let mut d = Debouncer::new(min_period);
    let mut captures = Vec::new();
    let mut queued: Vec<u64> = Vec::new();

    for &t in damage {
        match d.try_refresh(t) {
            RefreshDecision::CaptureNow { .. } => captures.push(t),
            RefreshDecision::Defer { token, .. } => queued.push(token),
            RefreshDecision::Coalesced => {}
        }
    }

    for token in queued {
        if d.on_deferred_fired(token) {
            captures.push(token);
        }
    }
    captures
}

// ── Monitor selection ─────────────────────────────────────────────────────────

#[test]
fn test_selection_never_returns_same_monitor_for_distinct_layouts() {
    let layouts: Vec<Vec<Monitor>> = vec![
        vec![
            Monitor::new("A", Rect::new(0, 0, 1920, 1080)),
            Monitor::new("B", Rect::new(1920, 0, 1280, 1024)),
        ],
        vec![
            Monitor::new("A", Rect::new(0, 0, 1280, 1024)),
            Monitor::new("B", Rect::new(-1920, 0, 1920, 1080)),
            Monitor::new("C", Rect::new(0, -1080, 1920, 1080)),
        ],
        vec![
            Monitor::new("A", Rect::new(0, 0, 2560, 1440)),
            Monitor::new("B", Rect::new(0, 1440, 2560, 1440)),
        ],
        vec![
            Monitor::new("A", Rect::new(0, 0, 800, 600)),
            Monitor::new("B", Rect::new(0, 0, 1024, 768)),
            Monitor::new("C", Rect::new(1024, 0, 1024, 768)),
            Monitor::new("D", Rect::new(2048, 0, 10, 10)),
        ],
    ];

    for monitors in &layouts {
        let sel = select_monitors(None, None, monitors).expect("selection");
        assert_ne!(sel.source.name, sel.destination.name);
        assert_ne!(sel.source.rect, sel.destination.rect);
    }
}

#[test]
fn test_selection_of_absent_name_fails_with_monitor_not_found() {
    let monitors = vec![
        Monitor::new("eDP-1", Rect::new(0, 0, 1920, 1080)),
        Monitor::new("HDMI-1", Rect::new(1920, 0, 800, 600)),
    ];
    let err = select_monitors(Some("DP-3"), None, &monitors).unwrap_err();
    assert_eq!(err, SelectionError::MonitorNotFound("DP-3".to_string()));
}

// ── Offset engine ─────────────────────────────────────────────────────────────

#[test]
fn test_centring_ignores_cursor_and_is_idempotent() {
    let source = Size::new(800, 600);
    let window = Size::new(1000, 700);
    let cursors = [
        CursorPosition::Outside,
        CursorPosition::Inside(Point::new(0, 0)),
        CursorPosition::Inside(Point::new(799, 599)),
    ];

    for cursor in cursors {
        let first = adjust_offset(Point::new(-5, 3), source, window, cursor);
        assert_eq!(first, Point::new(100, 50));
        assert_eq!(adjust_offset(first, source, window, cursor), first);
    }
}

#[test]
fn test_panning_keeps_cursor_inside_window() {
    let source = Size::new(1000, 1000);
    let window = Size::new(400, 400);
    let mut offset = Point::default();

    for x in [950, 10, 500, 999, 0, 401, 399] {
        offset = adjust_offset(offset, source, window, CursorPosition::Inside(Point::new(x, x)));
        let v = x + offset.x;
        assert!((0..400).contains(&v), "cursor {x} drawn at {v}");
        assert!(offset.x <= 0 && offset.x >= 400 - 1000);
    }
}

#[test]
fn test_panning_from_zero_to_far_right_cursor() {
    let offset = adjust_offset(
        Point::default(),
        Size::new(1000, 400),
        Size::new(400, 400),
        CursorPosition::Inside(Point::new(950, 0)),
    );
    assert!(offset.x <= -551);
    assert!(950 + offset.x < 400);
}

// ── Debounce ──────────────────────────────────────────────────────────────────

#[test]
fn test_damage_burst_yields_exactly_two_captures() {
    // All four notifications are handled before the deferred timer runs;
    // the late one at t=50 supersedes the deferred capture.
    let captures = replay_burst(40, &[0, 5, 10, 50]);
    assert_eq!(captures, vec![0, 50]);
}

#[test]
fn test_short_burst_is_completed_by_deferred_capture() {
    let captures = replay_burst(40, &[0, 5, 10]);
    assert_eq!(captures, vec![0, 40]);
}

// ── Pointer transitions ───────────────────────────────────────────────────────

#[test]
fn test_pointer_path_reports_one_enter_and_one_leave() {
    let mut tracker = PointerTracker::new(Rect::new(0, 0, 1920, 1080));
    let path = [
        Point::new(2500, 100),
        Point::new(100, 100),
        Point::new(200, 100),
        Point::new(2500, 100),
    ];

    let (mut entered, mut left) = (0, 0);
    for p in path {
        let t = tracker.on_pointer_moved(p, false);
        entered += usize::from(t.entered);
        left += usize::from(t.left);
    }

    assert_eq!(entered, 1);
    assert_eq!(left, 1);
}

// ── End-to-end geometry ───────────────────────────────────────────────────────

#[test]
fn test_windowed_mirror_on_800x600_projector() {
    let monitors = vec![
        Monitor::new("eDP-1", Rect::new(0, 0, 1920, 1080)),
        Monitor::new("VGA-1", Rect::new(1920, 0, 800, 600)),
    ];
    let sel = select_monitors(Some("eDP-1"), Some("VGA-1"), &monitors).expect("selection");

    let window = initial_window_rect(sel.source.rect, sel.destination.rect, false);

    assert!(window.width <= 700 && window.height <= 500);
    assert_eq!((window.x, window.y), (1970, 50));
}
