//! Removal of build products and, in full mode, of the generated trees.

use crate::error::{MacrogenError, Result};
use crate::layout::DirectoryLayout;
use globwalk::GlobWalkerBuilder;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files directly inside `base` whose names match `pattern`, sorted.
///
/// Returned paths are joined onto `base` as given, so a relative base yields
/// relative paths.
pub(crate) fn matching_files(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !base.is_dir() {
        return Ok(Vec::new());
    }
    // globwalk strips the base prefix from every entry and cannot do so for
    // `./`-prefixed relative bases
    let root = std::path::absolute(base).map_err(|e| MacrogenError::io(base, e))?;
    let walker = GlobWalkerBuilder::from_patterns(&root, &[pattern])
        .max_depth(1)
        .build()?;

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| MacrogenError::io(base, e.into()))?;
        if entry.file_type().is_file() {
            files.push(base.join(entry.file_name()));
        }
    }
    files.sort();
    Ok(files)
}

fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MacrogenError::io(path, e)),
    }
}

fn remove_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed directory {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MacrogenError::io(path, e)),
    }
}

pub struct Cleaner<'a> {
    layout: &'a DirectoryLayout,
    work_dir: PathBuf,
}

impl<'a> Cleaner<'a> {
    /// `work_dir` is where the coverage tool drops its stray reports.
    pub fn new(layout: &'a DirectoryLayout, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            work_dir: work_dir.into(),
        }
    }

    /// Removes coverage data, executables and the build directory. A full
    /// clean also removes the generated include and source trees.
    ///
    /// Missing targets are not an error.
    pub fn clean(&self, full: bool) -> Result<usize> {
        let mut removed = 0;

        for pattern in ["*.gcov", "*.gcda", "*.gcno"] {
            for file in matching_files(&self.work_dir, pattern)? {
                remove_file(&file)?;
                removed += 1;
            }
        }
        for file in matching_files(&self.layout.output_dir, "*.exe")? {
            remove_file(&file)?;
            removed += 1;
        }

        let mut dirs = vec![&self.layout.build_dir];
        if full {
            dirs.push(&self.layout.include_dir);
            dirs.push(&self.layout.src_dir);
        }
        for dir in dirs {
            if dir.exists() {
                removed += 1;
            }
            remove_dir(dir)?;
        }

        info!("Clean{} removed {} entries", if full { " (full)" } else { "" }, removed);
        Ok(removed)
    }
}
