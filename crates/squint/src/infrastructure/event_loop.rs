//! The control loop: one thread, one channel, one session.
//!
//! Every producer (the display reader thread, the refresh timers, the
//! signal handlers) posts [`MirrorEvent`]s; this loop hands them to
//! [`MirrorSession::handle`] one at a time, so handlers never overlap.
//!
//! # Signals (Unix)
//!
//! | Signal          | Effect                                   |
//! |-----------------|------------------------------------------|
//! | `SIGINT`        | disable the session and return           |
//! | `SIGTERM`       | disable the session and return           |
//! | `SIGUSR1`       | [`MirrorEvent::ToggleRequested`]         |

use std::future::Future;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::application::events::MirrorEvent;
use crate::application::session::MirrorSession;
use crate::infrastructure::display::DisplayBackend;
use crate::infrastructure::timers::TimerHost;

/// Runs until Ctrl-C / SIGTERM or until every event producer has gone away.
pub async fn run<B, T>(
    session: &mut MirrorSession<B, T>,
    events: &mut UnboundedReceiver<MirrorEvent>,
) where
    B: DisplayBackend,
    T: TimerHost,
{
    run_until(session, events, shutdown_signal()).await;
}

/// Like [`run`], but stops when `shutdown` completes.
///
/// The session is always disabled before this returns.
pub async fn run_until<B, T, F>(
    session: &mut MirrorSession<B, T>,
    events: &mut UnboundedReceiver<MirrorEvent>,
    shutdown: F,
) where
    B: DisplayBackend,
    T: TimerHost,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut toggles = ToggleSignal::install();

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            () = toggles.recv() => {
                debug!("toggle signal received");
                session.handle(MirrorEvent::ToggleRequested);
            }
            event = events.recv() => match event {
                Some(event) => session.handle(event),
                None => {
                    info!("event sources closed");
                    break;
                }
            },
        }
    }

    session.disable();
}

/// Completes on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => warn!("cannot listen for SIGTERM: {e}"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

// ── Toggle signal ─────────────────────────────────────────────────────────────

/// SIGUSR1 listener.  Never fires where the signal is unavailable.
struct ToggleSignal {
    #[cfg(unix)]
    inner: Option<tokio::signal::unix::Signal>,
}

impl ToggleSignal {
    fn install() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let inner = match signal(SignalKind::user_defined1()) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("cannot listen for SIGUSR1, toggling disabled: {e}");
                    None
                }
            };
            Self { inner }
        }
        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        if let Some(sig) = self.inner.as_mut() {
            if sig.recv().await.is_some() {
                return;
            }
            self.inner = None;
        }
        std::future::pending::<()>().await;
    }
}
