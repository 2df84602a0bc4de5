//! Monitor descriptors and the source/destination selection policy.
//!
//! A [`Monitor`] is a named output region reported by the display server.
//! Monitors are enumerated fresh for every selection: the list is a snapshot
//! and nothing here caches it across topology changes.
//!
//! # Selection rules
//!
//! 1. Fewer than two outputs and no names requested → [`SelectionError::InsufficientMonitors`].
//! 2. A requested name that is not in the list → [`SelectionError::MonitorNotFound`].
//! 3. Unresolved source → the monitor whose right edge (`x + width`) is
//!    greatest, skipping the destination if that one is already resolved.
//!    Ties keep the earlier monitor.
//! 4. Unresolved destination → the first monitor (enumeration order) that is
//!    not the source.
//! 5. Source and destination with identical rectangles → [`SelectionError::IdenticalRegions`].

use thiserror::Error;
use tracing::debug;

use super::geometry::Rect;

/// A display output: its name (e.g. `"HDMI-1"`) and its global rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub name: String,
    pub rect: Rect,
}

impl Monitor {
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
        }
    }
}

/// The outcome of a successful selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSelection {
    /// The monitor being mirrored.
    pub source: Monitor,
    /// The monitor hosting the mirror window.
    pub destination: Monitor,
}

/// Errors that can occur while choosing source and destination monitors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// A monitor was requested by name but is not connected.
    #[error("monitor not found: {0}")]
    MonitorNotFound(String),

    /// Not enough outputs to mirror one onto another.
    #[error("need at least two monitors, found {0}")]
    InsufficientMonitors(usize),

    /// Source and destination cover exactly the same area (cloned outputs).
    #[error("source and destination monitors cover the same region")]
    IdenticalRegions,
}

fn find_by_name(name: &str, monitors: &[Monitor]) -> Result<usize, SelectionError> {
    monitors
        .iter()
        .position(|m| m.name == name)
        .ok_or_else(|| SelectionError::MonitorNotFound(name.to_string()))
}

/// Index of the rightmost monitor, skipping `exclude`.
fn rightmost(monitors: &[Monitor], exclude: Option<usize>) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, m) in monitors.iter().enumerate() {
        if Some(i) == exclude {
            continue;
        }
        match best {
            Some(b) if monitors[b].rect.right() >= m.rect.right() => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Chooses the source and destination monitors.
///
/// `preferred_source` and `preferred_destination` are optional output names;
/// anything left unnamed is resolved heuristically.  See the module docs for
/// the exact rules.
///
/// # Errors
///
/// See [`SelectionError`].
pub fn select_monitors(
    preferred_source: Option<&str>,
    preferred_destination: Option<&str>,
    monitors: &[Monitor],
) -> Result<MonitorSelection, SelectionError> {
    let named = preferred_source.is_some() || preferred_destination.is_some();
    if monitors.len() < 2 && !named {
        return Err(SelectionError::InsufficientMonitors(monitors.len()));
    }

    let mut source = preferred_source
        .map(|n| find_by_name(n, monitors))
        .transpose()?;
    let destination = preferred_destination
        .map(|n| find_by_name(n, monitors))
        .transpose()?;

    if source.is_none() {
        source = rightmost(monitors, destination);
    }
    let source = source.ok_or(SelectionError::InsufficientMonitors(monitors.len()))?;

    let destination = match destination {
        Some(d) => d,
        None => (0..monitors.len())
            .find(|&i| i != source)
            .ok_or(SelectionError::InsufficientMonitors(monitors.len()))?,
    };

    let selection = MonitorSelection {
        source: monitors[source].clone(),
        destination: monitors[destination].clone(),
    };
    if selection.source.rect == selection.destination.rect {
        return Err(SelectionError::IdenticalRegions);
    }

    debug!(
        source = %selection.source.name,
        destination = %selection.destination.name,
        "monitors selected"
    );
    Ok(selection)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
