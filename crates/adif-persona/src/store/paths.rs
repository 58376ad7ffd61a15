//! Registry path resolution.
//!
//! The personas index lives at a per-user default location unless a project
//! declares an override. Resolution walks upward from the current working
//! directory to the nearest directory containing the project marker file
//! `adif-persona.json`; if that marker declares `"personas_index"`, the
//! value is resolved relative to the marker's directory:
//!
//! ```json
//! { "personas_index": ".adif/personas.json" }
//! ```
//!
//! An absent marker, a marker without the key, or a marker that cannot be
//! parsed all fall back to the default — path resolution never fails.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Project marker file name looked for in ancestor directories.
pub const PROJECT_MARKER: &str = "adif-persona.json";

/// File name of the personas index under the per-user config directory.
pub const INDEX_FILE: &str = "personas.json";

/// Per-user application directory name under `~/.config`.
pub const APP_DIR: &str = "adif-persona";

/// Recognized fields of the project marker file. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ProjectMarker {
    #[serde(default)]
    personas_index: Option<String>,
}

/// Resolve the personas index path from the current working directory.
///
/// Equivalent to [`resolve_index_path`] starting at the process cwd; if the
/// cwd itself cannot be determined the per-user default is returned.
pub fn personas_index_path() -> PathBuf {
    match std::env::current_dir() {
        Ok(cwd) => resolve_index_path(&cwd),
        Err(_) => default_index_path(),
    }
}

/// Resolve the personas index path starting the marker walk at `start`.
///
/// The walk stops at the first directory containing [`PROJECT_MARKER`];
/// later (higher) markers are never consulted, even when the nearest one
/// carries no override.
pub fn resolve_index_path(start: &Path) -> PathBuf {
    if let Some(marker) = find_marker(start) {
        if let Some(rel) = read_marker_override(&marker) {
            let base = marker.parent().unwrap_or_else(|| Path::new("."));
            return base.join(rel);
        }
    }
    default_index_path()
}

/// The fixed per-user default: `$HOME/.config/adif-persona/personas.json`.
pub fn default_index_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join(APP_DIR).join(INDEX_FILE)
}

/// Walk upward from `start`, returning the nearest marker file.
fn find_marker(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        let candidate = d.join(PROJECT_MARKER);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}

/// Read the `personas_index` override from a marker file, if present.
///
/// Unreadable or malformed markers yield `None`; an empty or
/// whitespace-only value is treated as absent.
fn read_marker_override(marker: &Path) -> Option<PathBuf> {
    let bytes = std::fs::read(marker).ok()?;
    let parsed: ProjectMarker = match serde_json::from_slice(&bytes) {
        Ok(p) => p,
        Err(e) => {
            log::debug!(
                "ignoring malformed project marker {}: {e}",
                marker.display()
            );
            return None;
        }
    };
    let rel = parsed.personas_index?;
    if rel.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(rel))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
