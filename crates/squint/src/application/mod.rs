//! Application layer: the mirror session and the events that drive it.
//!
//! # What lives here (for beginners)
//!
//! The domain crate (`squint_core`) knows how to pick monitors, pan a view
//! and throttle refreshes, but it never touches a display server.  This layer
//! strings those rules together into one long-running session and talks to
//! the outside world only through the traits in
//! [`crate::infrastructure::display`] and [`crate::infrastructure::timers`].
//!
//! # Sub-modules
//!
//! - **`events`**  – The [`events::MirrorEvent`] vocabulary every producer
//!   posts on the control channel.
//! - **`session`** – Enable/disable lifecycle and one handler per event.
//! - **`capture`** – Taking a frame and deciding whether a periodic timer
//!   is needed.

pub mod capture;
pub mod events;
pub mod session;
