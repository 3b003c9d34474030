#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the dashboard's input data.
//!
//! Relative data directories are resolved against the workspace root so the
//! binaries behave the same no matter where they are launched from.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`, falling back to the
/// current directory when the manifest sits fewer than two levels deep.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Resolves `dir` against [`project_root`] unless it is already absolute.
#[must_use]
pub fn resolve_data_dir(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        project_root().join(dir)
    }
}

/// Returns the static page directory served at `/`.
#[must_use]
pub fn app_dir() -> PathBuf {
    project_root().join("app")
}
