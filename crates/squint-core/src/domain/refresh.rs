//! Refresh policy and the damage debounce state machine.
//!
//! A session refreshes the mirrored image in one of two modes, fixed for the
//! lifetime of the session:
//!
//! - **Polling**: a periodic timer captures at `1000 / rate` ms.
//! - **Damage-driven**: the display server reports changed regions and the
//!   [`Debouncer`] decides whether to capture now, later, or not at all.
//!
//! # How the debouncer works (for beginners)
//!
//! Damage notifications arrive in bursts: scrolling a page can produce
//! hundreds per second.  Capturing for each one would waste time, so the
//! debouncer keeps `next_allowed`, the earliest timestamp at which another
//! capture may run:
//!
//! ```text
//! t ≥ next_allowed        → capture now, next_allowed = t + min_period
//! t < next_allowed        → schedule one deferred capture for next_allowed
//! deferred already queued → coalesce (nothing to do)
//! ```
//!
//! The deferred capture carries `next_allowed` as a token.  If a newer request
//! captured in the meantime, `next_allowed` has moved on and the stale token
//! is dropped instead of producing a duplicate refresh.

use std::time::Duration;

use super::geometry::Rect;

/// Polling rate used when nothing else is configured.
pub const DEFAULT_POLL_RATE_HZ: u32 = 25;

/// Rate limit applied when a limit is requested without a value.
pub const DEFAULT_RATE_LIMIT_HZ: u32 = 50;

/// A request more than this far *behind* `next_allowed` is treated as a
/// clock discontinuity (e.g. server timestamp wrap) rather than a burst.
pub const DISCONTINUITY_MS: u64 = 1000;

/// User-requested rate settings, before capabilities are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateSettings {
    /// Explicit polling rate.  Forces polling mode.
    pub fixed_rate_hz: Option<u32>,
    /// Upper bound on the refresh rate.
    pub rate_limit_hz: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Polling,
    DamageDriven,
}

/// How the session refreshes, resolved once per enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub mode: RefreshMode,
    /// Polling frequency.  Also drives pointer polling when raw pointer
    /// events are unavailable.
    pub target_rate_hz: u32,
    /// Minimum spacing between damage-driven captures; zero means unlimited.
    pub min_refresh_period_ms: u64,
}

impl RefreshPolicy {
    /// Resolves the policy from user settings and whether damage detection
    /// actually started.
    pub fn resolve(settings: RateSettings, damage_active: bool) -> Self {
        let mode = if damage_active && settings.fixed_rate_hz.is_none() {
            RefreshMode::DamageDriven
        } else {
            RefreshMode::Polling
        };

        let mut rate = settings.fixed_rate_hz.unwrap_or(DEFAULT_POLL_RATE_HZ).max(1);
        if let Some(limit) = settings.rate_limit_hz {
            rate = rate.min(limit.max(1));
        }

        let min_refresh_period_ms = settings
            .rate_limit_hz
            .map(|limit| 1000 / u64::from(limit.max(1)))
            .unwrap_or(0);

        Self {
            mode,
            target_rate_hz: rate,
            min_refresh_period_ms,
        }
    }

    /// Interval of the periodic timer.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.target_rate_hz.max(1)))
    }
}

/// What the caller must do after [`Debouncer::try_refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// Capture immediately.  When `cancel_pending` is set, a previously
    /// scheduled deferred capture must be cancelled first.
    CaptureNow { cancel_pending: bool },
    /// Schedule one deferred capture after `delay_ms`, tagged with `token`.
    Defer { delay_ms: u64, token: u64 },
    /// A deferred capture is already queued and will cover this request.
    Coalesced,
}

/// Rate limiter for damage-driven captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    min_period_ms: u64,
    next_allowed: u64,
    pending: Option<u64>,
}

impl Debouncer {
    pub fn new(min_period_ms: u64) -> Self {
        Self {
            min_period_ms,
            next_allowed: 0,
            pending: None,
        }
    }

    /// Decides what to do with a refresh request stamped `t` (milliseconds).
    pub fn try_refresh(&mut self, t: u64) -> RefreshDecision {
        let discontinuity = self.next_allowed > t.saturating_add(DISCONTINUITY_MS);
        if t >= self.next_allowed || discontinuity {
            let cancel_pending = self.pending.take().is_some();
            self.next_allowed = t.saturating_add(self.min_period_ms);
            return RefreshDecision::CaptureNow { cancel_pending };
        }

        if self.pending.is_some() {
            return RefreshDecision::Coalesced;
        }

        self.pending = Some(self.next_allowed);
        RefreshDecision::Defer {
            delay_ms: self.next_allowed - t,
            token: self.next_allowed,
        }
    }

    /// Called when a deferred capture fires.  Returns `true` when the capture
    /// should run, `false` when `token` is stale.
    pub fn on_deferred_fired(&mut self, token: u64) -> bool {
        if self.pending != Some(token) || self.next_allowed != token {
            return false;
        }
        self.pending = None;
        self.next_allowed = token.saturating_add(self.min_period_ms);
        true
    }
}

/// Clips a damaged area to the source region.  `None` means the damage does
/// not touch the source and must be ignored.
pub fn clip_damage(area: Rect, source: &Rect) -> Option<Rect> {
    area.intersection(source)
}

/// Damage-driven captures are suppressed while the mirror window overlaps
/// the source, otherwise each capture would damage the source again.
pub fn feedback_loop(source: &Rect, window: &Rect) -> bool {
    source.intersects(window)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
