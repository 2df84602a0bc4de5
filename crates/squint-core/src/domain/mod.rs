//! Domain entities and policies for the screen mirror.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The domain is the innermost layer.  It holds the rules that make squint
//! what it is (how monitors are picked, when the image is refreshed, when the
//! mirror hides) and nothing else: no X11 calls, no timers, no files.  Outer
//! layers feed it plain values and act on the plain values it returns.

pub mod crosshair;
pub mod cursor_image;
pub mod follow;
pub mod geometry;
pub mod monitor;
pub mod pointer;
pub mod refresh;
pub mod viewport;
pub mod visibility;
