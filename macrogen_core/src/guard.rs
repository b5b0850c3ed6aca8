//! Fail-fast checks run before any expensive stage.

use crate::error::{MacrogenError, Result};
use crate::layout::DirectoryLayout;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Creates every directory of the layout. Existing directories are left alone.
pub fn ensure_ready(layout: &DirectoryLayout) -> Result<()> {
    for dir in layout.required_dirs() {
        trace!("Asserting directory {:?}", dir);
        fs::create_dir_all(&dir).map_err(|e| MacrogenError::io(&dir, e))?;
    }
    debug!("Directory structure in place under {:?}", layout.output_dir);
    Ok(())
}

/// Asserts that `program` is installed and available in PATH.
pub fn require_executable(program: &str) -> Result<PathBuf> {
    match which::which(program) {
        Ok(path) => {
            debug!("Found {} at {:?}", program, path);
            Ok(path)
        }
        Err(e) => {
            debug!("Lookup of {} failed: {}", program, e);
            Err(MacrogenError::missing_executable(program))
        }
    }
}

/// Asserts that a given file exists.
pub fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(MacrogenError::missing_file(path))
    }
}
