//! File system helpers.

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// Ensure the directory that will hold `output` exists and is writable.
///
/// A multi-year run only writes at the very end, so an unwritable
/// destination is checked up front by creating and removing a scratch file.
#[instrument(level = "info", skip_all, fields(path = %output.display()))]
pub fn ensure_writable_parent(output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let scratch = dir.join("..__write_check__");
    fs::File::create(&scratch)?;
    let _ = fs::remove_file(&scratch);
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}

/// Delete a previous run's output so a failed run leaves nothing behind.
///
/// Returns whether a file was removed.
pub fn remove_stale_output(output: &Path) -> Result<bool> {
    if !output.exists() {
        return Ok(false);
    }
    fs::remove_file(output)?;
    info!(path = %output.display(), "Removed previous output");
    Ok(true)
}
