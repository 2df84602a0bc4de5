//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads and writes the TOML settings file (monitor
//! name preferences, fullscreen/windowed mode, refresh rates, log level) and
//! supplies defaults on first run, when no file exists yet.

pub mod config;
