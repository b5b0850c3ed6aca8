//! Source formatting through an external formatter.

use crate::config::FormatterConfig;
use crate::error::{MacrogenError, Result};
use crate::layout::DirectoryLayout;
use crate::runner::{CommandRunner, Invocation};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// C source and header extensions.
pub const C_EXTENSIONS: &[&str] = &["h", "c"];
pub const HEADER_EXTENSIONS: &[&str] = &["h"];

/// Sorted files below `root` with one of `extensions`, skipping anything
/// under `exclude`.
pub fn collect_files(
    root: &Path,
    extensions: &[&str],
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| exclude.is_none_or(|ex| e.path() != ex));
    for entry in walker {
        let entry = entry.map_err(|e| MacrogenError::io(root, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

pub struct Formatter<'a, R: CommandRunner> {
    runner: &'a R,
    config: &'a FormatterConfig,
}

impl<'a, R: CommandRunner> Formatter<'a, R> {
    pub fn new(runner: &'a R, config: &'a FormatterConfig) -> Self {
        Self { runner, config }
    }

    /// Formats `files` in place with one formatter invocation. Nothing runs
    /// when the list is empty.
    pub fn format_files(&self, files: &[PathBuf]) -> Result<usize> {
        if files.is_empty() {
            debug!("Nothing to format");
            return Ok(0);
        }
        let invocation = Invocation::new(&self.config.program)
            .args(&self.config.args)
            .args(files);
        self.runner.run(&invocation)?;
        info!("Formatted {} files", files.len());
        Ok(files.len())
    }

    /// The generated include and source trees.
    pub fn format_generated(&self, layout: &DirectoryLayout) -> Result<usize> {
        let mut files = collect_files(&layout.include_dir, C_EXTENSIONS, None)?;
        files.extend(collect_files(&layout.src_dir, C_EXTENSIONS, None)?);
        self.format_files(&files)
    }

    /// The library's own headers.
    pub fn format_library(&self, layout: &DirectoryLayout) -> Result<usize> {
        self.format_files(&collect_files(
            &layout.library_include_dir,
            HEADER_EXTENSIONS,
            None,
        )?)
    }

    /// The whole test tree, build products excluded.
    pub fn format_tests(&self, layout: &DirectoryLayout) -> Result<usize> {
        self.format_files(&collect_files(
            &layout.output_dir,
            C_EXTENSIONS,
            Some(&layout.build_dir),
        )?)
    }
}
