//! Infrastructure layer for squint.
//!
//! Contains OS-facing adapters: the display-server backend, timers, the
//! control loop that drives the session, and file-system storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `squint_core`, but the domain never imports it.

pub mod display;
pub mod event_loop;
pub mod storage;
pub mod timers;
