//! Periodic and deferred timers that post events back onto the control loop.
//!
//! The session never sleeps.  It asks a [`TimerHost`] to deliver a
//! [`MirrorEvent::Tick`] every period, or a single
//! [`MirrorEvent::DeferredCapture`] after a delay, and carries on.  Both
//! kinds of timer are cancellable.  A deferred event that was already queued
//! when it got cancelled still arrives; the session drops it by its token.
//!
//! # Implementations
//!
//! - [`TokioTimers`] spawns one Tokio task per timer and aborts the task to
//!   cancel it.  Must be used from inside a Tokio runtime.
//! - [`ManualTimers`] only records what was requested.  Tests fire the
//!   events themselves.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

use crate::application::events::MirrorEvent;

/// Timer services used by the mirror session.
#[cfg_attr(test, mockall::automock)]
pub trait TimerHost {
    /// Starts (or restarts) the periodic refresh timer.
    fn start_periodic(&mut self, period: Duration);

    /// Stops the periodic timer.  No-op when none is running.
    fn stop_periodic(&mut self);

    /// Schedules a single deferred capture carrying `token`.  Replaces any
    /// deferred capture that is still pending.
    fn schedule_deferred(&mut self, delay: Duration, token: u64);

    /// Cancels the pending deferred capture.  No-op when none is pending.
    fn cancel_deferred(&mut self);
}

// ── Tokio implementation ──────────────────────────────────────────────────────

/// [`TimerHost`] backed by Tokio tasks.
pub struct TokioTimers {
    events: UnboundedSender<MirrorEvent>,
    periodic: Option<JoinHandle<()>>,
    deferred: Option<JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(events: UnboundedSender<MirrorEvent>) -> Self {
        Self {
            events,
            periodic: None,
            deferred: None,
        }
    }
}

impl TimerHost for TokioTimers {
    fn start_periodic(&mut self, period: Duration) {
        self.stop_periodic();
        let tx = self.events.clone();
        self.periodic = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the session has just
            // captured, so skip it.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(MirrorEvent::Tick).is_err() {
                    break;
                }
            }
        }));
        trace!(?period, "periodic timer started");
    }

    fn stop_periodic(&mut self) {
        if let Some(handle) = self.periodic.take() {
            handle.abort();
            trace!("periodic timer stopped");
        }
    }

    fn schedule_deferred(&mut self, delay: Duration, token: u64) {
        self.cancel_deferred();
        let tx = self.events.clone();
        self.deferred = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(MirrorEvent::DeferredCapture { token });
        }));
    }

    fn cancel_deferred(&mut self) {
        if let Some(handle) = self.deferred.take() {
            handle.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        self.stop_periodic();
        self.cancel_deferred();
    }
}

// ── Recording implementation (always compiled for tests) ──────────────────────

/// One request made against [`ManualTimers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCall {
    StartPeriodic(Duration),
    StopPeriodic,
    ScheduleDeferred { delay: Duration, token: u64 },
    CancelDeferred,
}

/// [`TimerHost`] that records requests and never fires.
#[derive(Debug, Default)]
pub struct ManualTimers {
    pub calls: Vec<TimerCall>,
    periodic: Option<Duration>,
    deferred: Option<u64>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Period of the running periodic timer, if any.
    pub fn periodic(&self) -> Option<Duration> {
        self.periodic
    }

    /// Token of the pending deferred capture, if any.
    pub fn pending_deferred(&self) -> Option<u64> {
        self.deferred
    }

    /// Marks the pending deferred capture as fired and returns its token.
    pub fn take_deferred(&mut self) -> Option<u64> {
        self.deferred.take()
    }
}

impl TimerHost for ManualTimers {
    fn start_periodic(&mut self, period: Duration) {
        self.periodic = Some(period);
        self.calls.push(TimerCall::StartPeriodic(period));
    }

    fn stop_periodic(&mut self) {
        self.periodic = None;
        self.calls.push(TimerCall::StopPeriodic);
    }

    fn schedule_deferred(&mut self, delay: Duration, token: u64) {
        self.deferred = Some(token);
        self.calls.push(TimerCall::ScheduleDeferred { delay, token });
    }

    fn cancel_deferred(&mut self) {
        self.deferred = None;
        self.calls.push(TimerCall::CancelDeferred);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
