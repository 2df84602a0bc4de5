//! MirrorSession: the enable/disable state machine and its event handlers.
//!
//! A session is either disabled (`active == None`) or enabled.  Enabling
//! builds every per-session entity in dependency order; disabling tears them
//! down in exactly the reverse order, so no subsystem is ever used after one
//! it depends on has been released.
//!
//! # Enable order
//!
//! ```text
//! 1. select monitors            (mandatory)
//! 2. create hosting surface     (mandatory) + initial offset snap
//! 3. focus tracking             (best effort)
//! 4. raw pointer tracking       (best effort, needs XInput 2.2)
//! 5. cursor overlay             (best effort, needs true colour + XFixes + SHAPE)
//! 6. damage detection           (best effort, skipped with a fixed rate)
//! 7. refresh timer              (mode actually achieved)
//! 8. one capture + one visibility evaluation
//! ```
//!
//! # Architecture
//!
//! The session depends only on the display ports and on [`TimerHost`].  Both
//! are injected at construction time, so every handler can be unit-tested
//! with [`MockDisplay`](crate::infrastructure::display::MockDisplay) and
//! [`ManualTimers`](crate::infrastructure::timers::ManualTimers).
//!
//! All handlers run on the single control thread and finish before the next
//! event is dispatched; no locking is involved.

use std::time::Duration;

use squint_core::domain::refresh::{clip_damage, feedback_loop};
use squint_core::{
    adjust_offset, initial_window_rect, is_modifier_keysym, overlay_origin, select_monitors,
    ActiveWindowFollower, CursorImage, CursorPosition, Debouncer, Point, PointerTracker,
    RateSettings, Rect, RefreshDecision, RefreshMode, RefreshPolicy, SelectionError,
    VisibilityCommand, VisibilityState,
};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use super::capture::{capture_frame, needs_periodic_timer};
use super::events::MirrorEvent;
use crate::infrastructure::display::{DisplayBackend, DisplayError, SurfaceSpec};
use crate::infrastructure::timers::TimerHost;

/// Two clicks on the mirror closer than this restore its geometry.
pub const DOUBLE_CLICK_MS: u64 = 400;

/// Why a session could not be enabled.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot enumerate monitors: {0}")]
    Enumeration(#[source] DisplayError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("cannot create mirror window: {0}")]
    Surface(#[source] DisplayError),
}

/// User choices that stay fixed across enable/disable cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOptions {
    /// Output to mirror; picked heuristically when `None`.
    pub source: Option<String>,
    /// Output hosting the mirror; picked heuristically when `None`.
    pub destination: Option<String>,
    pub fullscreen: bool,
    pub rates: RateSettings,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            fullscreen: true,
            rates: RateSettings::default(),
        }
    }
}

/// Which optional subsystems actually started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Subsystems {
    focus: bool,
    pointer: bool,
    overlay: bool,
    damage: bool,
    periodic: bool,
}

/// Everything owned by an enabled session.
#[derive(Debug)]
struct ActiveSession {
    source: Rect,
    /// Policy geometry of the hosting window, restored on double-click.
    home: Rect,
    /// Current hosting window geometry.
    window: Rect,
    offset: Point,
    policy: RefreshPolicy,
    debouncer: Debouncer,
    tracker: PointerTracker,
    follower: ActiveWindowFollower,
    visibility: VisibilityState,
    cursor_image: Option<CursorImage>,
    subsystems: Subsystems,
    last_click_ms: Option<u64>,
}

/// The process-wide mirror session.
pub struct MirrorSession<B, T> {
    backend: B,
    timers: T,
    options: MirrorOptions,
    active: Option<ActiveSession>,
}

impl<B: DisplayBackend, T: TimerHost> MirrorSession<B, T> {
    pub fn new(backend: B, timers: T, options: MirrorOptions) -> Self {
        Self {
            backend,
            timers,
            options,
            active: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    /// Refresh policy of the enabled session.
    pub fn policy(&self) -> Option<RefreshPolicy> {
        self.active.as_ref().map(|s| s.policy)
    }

    /// Current hosting window geometry.
    pub fn window_rect(&self) -> Option<Rect> {
        self.active.as_ref().map(|s| s.window)
    }

    /// Current view offset inside the hosting window.
    pub fn offset(&self) -> Option<Point> {
        self.active.as_ref().map(|s| s.offset)
    }

    pub fn cursor_position(&self) -> CursorPosition {
        self.active
            .as_ref()
            .map_or(CursorPosition::Outside, |s| s.tracker.position())
    }

    pub fn is_raised(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.visibility.is_raised())
    }

    pub fn cursor_overlay_active(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.subsystems.overlay)
    }

    pub fn pointer_tracked(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.subsystems.pointer)
    }

    // ── Enable / disable ──────────────────────────────────────────────────────

    /// Starts mirroring.  No-op when already enabled.
    ///
    /// # Errors
    ///
    /// Fails only when monitors cannot be selected or the hosting surface
    /// cannot be created; the session then stays disabled.  Optional
    /// subsystems that fail to start are logged and skipped.
    pub fn enable(&mut self) -> Result<(), SessionError> {
        if self.active.is_some() {
            debug!("enable requested while already enabled");
            return Ok(());
        }

        // 1. Monitor selection.
        let monitors = self.backend.monitors().map_err(SessionError::Enumeration)?;
        let selection = select_monitors(
            self.options.source.as_deref(),
            self.options.destination.as_deref(),
            &monitors,
        )?;
        let source = selection.source.rect;
        let destination = selection.destination.rect;

        // 2. Hosting surface and initial snap.
        let fullscreen = self.options.fullscreen;
        let window = initial_window_rect(source, destination, fullscreen);
        self.backend
            .create_surface(&SurfaceSpec {
                window,
                source,
                fullscreen,
            })
            .map_err(SessionError::Surface)?;
        let offset = adjust_offset(
            Point::default(),
            source.size(),
            window.size(),
            CursorPosition::Outside,
        );
        self.backend.place_view(offset);

        let caps = self.backend.capabilities();
        let mut subsystems = Subsystems::default();

        // 3. Focus tracking.
        match self.backend.start_focus_tracking() {
            Ok(()) => subsystems.focus = true,
            Err(e) => warn!("active-window tracking unavailable: {e}"),
        }

        // 4. Raw pointer tracking.
        if caps.raw_pointer {
            match self.backend.start_pointer_tracking() {
                Ok(()) => subsystems.pointer = true,
                Err(e) => warn!("raw pointer events unavailable, polling instead: {e}"),
            }
        }

        // 5. Cursor overlay.
        let mut cursor_image = None;
        if caps.cursor_overlay() {
            match start_cursor_overlay(&mut self.backend) {
                Ok(image) => {
                    cursor_image = Some(image);
                    subsystems.overlay = true;
                }
                Err(e) => warn!("cursor duplication unavailable, drawing crosshair: {e}"),
            }
        }

        // 6. Damage detection.
        if self.options.rates.fixed_rate_hz.is_none() && caps.damage {
            match self.backend.start_damage(source) {
                Ok(()) => subsystems.damage = true,
                Err(e) => warn!("damage detection unavailable, polling instead: {e}"),
            }
        }

        // 7. Refresh scheduler.
        let policy = RefreshPolicy::resolve(self.options.rates, subsystems.damage);
        if needs_periodic_timer(&policy, subsystems.pointer) {
            self.timers.start_periodic(policy.poll_interval());
            subsystems.periodic = true;
        }

        info!(
            source = %selection.source.name,
            source_rect = ?source,
            destination = %selection.destination.name,
            destination_rect = ?destination,
            "mirroring enabled"
        );
        info!(
            mode = ?policy.mode,
            rate_hz = policy.target_rate_hz,
            min_period_ms = policy.min_refresh_period_ms,
            raw_pointer = subsystems.pointer,
            cursor_overlay = subsystems.overlay,
            focus_follow = subsystems.focus,
            "refresh configured"
        );

        self.active = Some(ActiveSession {
            source,
            home: window,
            window,
            offset,
            policy,
            debouncer: Debouncer::new(policy.min_refresh_period_ms),
            tracker: PointerTracker::new(source),
            follower: ActiveWindowFollower::new(source, destination, self.backend.root_rect()),
            visibility: VisibilityState::new(true),
            cursor_image,
            subsystems,
            last_click_ms: None,
        });

        // 8. First frame and first visibility decision.
        self.capture_now();
        self.on_pointer_moved(None, true);
        self.on_active_window_changed();
        Ok(())
    }

    /// Stops mirroring and releases everything.  No-op when disabled.
    pub fn disable(&mut self) {
        let Some(s) = self.active.take() else {
            debug!("disable requested while already disabled");
            return;
        };

        if s.subsystems.periodic {
            self.timers.stop_periodic();
        }
        self.timers.cancel_deferred();
        if s.subsystems.damage {
            self.backend.stop_damage();
        }
        if s.subsystems.overlay {
            self.backend.destroy_overlay();
        }
        if s.subsystems.pointer {
            self.backend.stop_pointer_tracking();
        }
        if s.subsystems.focus {
            self.backend.stop_focus_tracking();
        }
        self.backend.destroy_surface();
        info!("mirroring disabled");
    }

    /// Enables and reports failure through the log only.  Used for requests
    /// that arrive after startup, when the process must keep running.
    fn enable_logged(&mut self) {
        if let Err(e) = self.enable() {
            error!("cannot enable mirroring: {e}");
        }
    }

    // ── Event dispatch ────────────────────────────────────────────────────────

    /// Dispatches one event.  Events other than enable/disable requests and
    /// topology changes are ignored while disabled (they may have been queued
    /// before the session stopped).
    pub fn handle(&mut self, event: MirrorEvent) {
        match event {
            MirrorEvent::ToggleRequested => {
                if self.is_enabled() {
                    self.disable();
                } else {
                    self.enable_logged();
                }
            }
            MirrorEvent::EnableRequested => self.enable_logged(),
            MirrorEvent::DisableRequested => self.disable(),
            MirrorEvent::TopologyChanged => self.on_topology_changed(),
            _ if self.active.is_none() => trace!(?event, "ignored while disabled"),
            MirrorEvent::PointerMoved { time_ms } => self.on_pointer_moved(Some(time_ms), false),
            MirrorEvent::KeyPressed { keysym } => self.on_key_pressed(keysym),
            MirrorEvent::ActiveWindowChanged => self.on_active_window_changed(),
            MirrorEvent::WindowConfigured { rect } => self.on_window_configured(rect),
            MirrorEvent::ButtonPressed { time_ms } => self.on_button_pressed(time_ms),
            MirrorEvent::Damage { time_ms, area } => self.on_damage(time_ms, area),
            MirrorEvent::CursorShapeChanged => self.on_cursor_shape_changed(),
            MirrorEvent::Tick => self.on_tick(),
            MirrorEvent::DeferredCapture { token } => self.on_deferred_capture(token),
        }
    }

    // ── Handlers ──────────────────────────────────────────────────────────────

    fn on_topology_changed(&mut self) {
        if !self.is_enabled() {
            return;
        }
        info!("monitor layout changed, restarting mirror");
        self.disable();
        self.enable_logged();
    }

    fn on_tick(&mut self) {
        let (pointer, mode) = match &self.active {
            Some(s) => (s.subsystems.pointer, s.policy.mode),
            None => return,
        };
        if !pointer {
            self.on_pointer_moved(None, false);
        }
        if mode == RefreshMode::Polling {
            self.capture_now();
        }
    }

    /// Re-reads the pointer and applies its consequences: offset, overlay
    /// position, visibility, and a crosshair refresh in damage mode.
    ///
    /// `time_ms` is the server timestamp of a raw motion event, `None` when
    /// the pointer is polled.
    fn on_pointer_moved(&mut self, time_ms: Option<u64>, force: bool) {
        let Some(s) = self.active.as_mut() else {
            return;
        };
        let raw = match self.backend.query_pointer() {
            Ok(p) => p,
            Err(e) => {
                debug!("pointer query failed: {e}");
                return;
            }
        };

        let transition = s.tracker.on_pointer_moved(raw, force);
        if !transition.moved && !force {
            return;
        }
        reposition(&mut self.backend, s);

        let fullscreen = self.options.fullscreen;
        if transition.entered {
            if s.subsystems.overlay {
                self.backend.set_overlay_mapped(true);
            }
            apply_visibility(&mut self.backend, s, VisibilityCommand::Show, fullscreen);
        } else if transition.left {
            if s.subsystems.overlay {
                self.backend.set_overlay_mapped(false);
            }
            apply_visibility(&mut self.backend, s, VisibilityCommand::Hide, fullscreen);
        }

        // The crosshair is part of the captured image, so it only moves when
        // the image is refreshed.  Polling refreshes on its own.
        let crosshair = !s.subsystems.overlay && s.policy.mode == RefreshMode::DamageDriven;
        if crosshair && !force {
            if feedback_loop(&s.source, &s.window) {
                trace!("mirror overlaps source, crosshair refresh skipped");
                return;
            }
            match time_ms {
                Some(t) => request_refresh(&mut self.backend, &mut self.timers, s, t),
                None => capture_active(&mut self.backend, s),
            }
        }
    }

    /// Typing usually means the focused window is where the user looks, so a
    /// non-modifier key re-reads the active window like a focus change.
    fn on_key_pressed(&mut self, keysym: u32) {
        if is_modifier_keysym(keysym) {
            return;
        }
        self.on_active_window_changed();
    }

    fn on_active_window_changed(&mut self) {
        let Some(s) = self.active.as_mut() else {
            return;
        };
        let geometry = self
            .backend
            .active_window()
            .and_then(|w| self.backend.top_level_geometry(w));
        if geometry.is_none() {
            trace!("active window geometry unavailable, skipping");
        }
        if let Some(cmd) = s.follower.on_active_window_geometry(geometry) {
            debug!(?cmd, "active window moved focus");
            apply_visibility(&mut self.backend, s, cmd, self.options.fullscreen);
        }
    }

    fn on_window_configured(&mut self, rect: Rect) {
        let Some(s) = self.active.as_mut() else {
            return;
        };
        if rect == s.window {
            return;
        }
        s.window = rect;
        reposition(&mut self.backend, s);
    }

    /// A single click lowers the mirror so the user can reach what is
    /// beneath it.  A double click puts the window back where the viewport
    /// policy wants it and shows it again.
    fn on_button_pressed(&mut self, time_ms: u64) {
        let Some(s) = self.active.as_mut() else {
            return;
        };
        let fullscreen = self.options.fullscreen;
        let double = s
            .last_click_ms
            .is_some_and(|prev| server_elapsed_ms(prev, time_ms) <= DOUBLE_CLICK_MS);

        if !double {
            s.last_click_ms = Some(time_ms);
            s.visibility.force_hidden();
            self.backend.lower(fullscreen);
            return;
        }

        s.last_click_ms = None;
        if let Err(e) = self.backend.set_window_geometry(s.home) {
            warn!("cannot restore mirror geometry: {e}");
            return;
        }
        s.window = s.home;
        reposition(&mut self.backend, s);
        self.backend.place_view(s.offset);
        self.backend.invalidate();
        apply_visibility(&mut self.backend, s, VisibilityCommand::Show, fullscreen);
    }

    fn on_damage(&mut self, time_ms: u64, area: Rect) {
        let Some(s) = self.active.as_mut() else {
            return;
        };
        if !s.subsystems.damage {
            return;
        }
        if clip_damage(area, &s.source).is_none() {
            return;
        }
        if feedback_loop(&s.source, &s.window) {
            trace!("mirror overlaps source, damage ignored");
            return;
        }
        request_refresh(&mut self.backend, &mut self.timers, s, time_ms);
    }

    fn on_deferred_capture(&mut self, token: u64) {
        let Some(s) = self.active.as_mut() else {
            return;
        };
        if s.debouncer.on_deferred_fired(token) {
            capture_active(&mut self.backend, s);
        } else {
            trace!(token, "stale deferred capture dropped");
        }
    }

    fn on_cursor_shape_changed(&mut self) {
        let Some(s) = self.active.as_mut() else {
            return;
        };
        if !s.subsystems.overlay {
            return;
        }
        let image = match self.backend.fetch_cursor_image() {
            Ok(image) => image,
            Err(e) => {
                debug!("cursor image query failed: {e}");
                return;
            }
        };
        if let Err(e) = self.backend.upload_cursor_image(&image) {
            debug!("cursor image upload failed: {e}");
            return;
        }
        s.cursor_image = Some(image);
        move_overlay(&mut self.backend, s);
    }

    fn capture_now(&mut self) {
        if let Some(s) = self.active.as_mut() {
            capture_active(&mut self.backend, s);
        }
    }
}

// ── Helpers shared by the handlers ────────────────────────────────────────────

/// Milliseconds between two server timestamps.  The server clock is a 32-bit
/// counter that wraps about every 49.7 days.
fn server_elapsed_ms(earlier: u64, later: u64) -> u64 {
    u64::from((later as u32).wrapping_sub(earlier as u32))
}

fn start_cursor_overlay<B: DisplayBackend>(backend: &mut B) -> Result<CursorImage, DisplayError> {
    backend.create_overlay()?;
    let uploaded = backend
        .fetch_cursor_image()
        .and_then(|image| backend.upload_cursor_image(&image).map(|()| image));
    if uploaded.is_err() {
        backend.destroy_overlay();
    }
    uploaded
}

fn capture_active<B: DisplayBackend>(backend: &mut B, s: &ActiveSession) {
    if let Err(e) = capture_frame(backend, s.source, s.tracker.position(), s.subsystems.overlay) {
        warn!("capture failed: {e}");
    }
}

fn request_refresh<B: DisplayBackend, T: TimerHost>(
    backend: &mut B,
    timers: &mut T,
    s: &mut ActiveSession,
    time_ms: u64,
) {
    match s.debouncer.try_refresh(time_ms) {
        RefreshDecision::CaptureNow { cancel_pending } => {
            if cancel_pending {
                timers.cancel_deferred();
            }
            capture_active(backend, s);
        }
        RefreshDecision::Defer { delay_ms, token } => {
            timers.schedule_deferred(Duration::from_millis(delay_ms), token);
        }
        RefreshDecision::Coalesced => {}
    }
}

fn apply_visibility<B: DisplayBackend>(
    backend: &mut B,
    s: &mut ActiveSession,
    cmd: VisibilityCommand,
    fullscreen: bool,
) {
    if !s.visibility.apply(cmd) {
        return;
    }
    match cmd {
        VisibilityCommand::Show => backend.raise(fullscreen),
        VisibilityCommand::Hide => backend.lower(fullscreen),
    }
}

/// Recomputes the view offset for the current window and pointer; moves the
/// view (and invalidates it) when the offset changed, and keeps the cursor
/// overlay on the pointer.
fn reposition<B: DisplayBackend>(backend: &mut B, s: &mut ActiveSession) {
    let offset = adjust_offset(s.offset, s.source.size(), s.window.size(), s.tracker.position());
    if offset != s.offset {
        s.offset = offset;
        backend.place_view(offset);
        backend.invalidate();
    }
    move_overlay(backend, s);
}

fn move_overlay<B: DisplayBackend>(backend: &mut B, s: &ActiveSession) {
    if !s.subsystems.overlay {
        return;
    }
    if let (Some(at), Some(image)) = (s.tracker.position().point(), &s.cursor_image) {
        backend.move_overlay(overlay_origin(at, image.hotspot(), s.offset));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
