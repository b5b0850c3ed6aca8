//! Runs the instrumented suite and collects per-object coverage reports.

use crate::clean::matching_files;
use crate::config::CoverageConfig;
use crate::error::{MacrogenError, Result};
use crate::guard::require_file;
use crate::layout::{DirectoryLayout, Target};
use crate::registry::Registry;
use crate::runner::{CommandRunner, Invocation};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a coverage run left behind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    /// Report files in their final location.
    pub reports: Vec<PathBuf>,
    /// Report files discarded before relocation.
    pub discarded: usize,
}

pub struct CoverageRunner<'a, R: CommandRunner> {
    runner: &'a R,
    layout: &'a DirectoryLayout,
    registry: &'a Registry,
    config: &'a CoverageConfig,
    work_dir: PathBuf,
}

impl<'a, R: CommandRunner> CoverageRunner<'a, R> {
    pub fn new(
        runner: &'a R,
        layout: &'a DirectoryLayout,
        registry: &'a Registry,
        config: &'a CoverageConfig,
    ) -> Self {
        Self {
            runner,
            layout,
            registry,
            config,
            work_dir: PathBuf::from("."),
        }
    }

    /// Directory the report generator runs in and writes its reports to.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Objects reported on: the driver first, then registry order.
    pub fn objects(&self) -> Vec<PathBuf> {
        std::iter::once(self.layout.driver_object(Target::Coverage))
            .chain(self.registry.iter().map(|s| self.layout.object_path(s)))
            .collect()
    }

    fn absolute(path: &Path) -> Result<PathBuf> {
        std::path::absolute(path).map_err(|e| MacrogenError::io(path, e))
    }

    /// Runs the coverage executable, then the report generator over every
    /// object. Library header reports are deleted. With `tidy`, remaining
    /// reports are moved into the coverage directory.
    pub fn run(&self, tidy: bool) -> Result<CoverageReport> {
        let executable = self.layout.executable(Target::Coverage);
        require_file(&executable)?;
        self.runner
            .run(&Invocation::new(Self::absolute(&executable)?))?;

        for object in self.objects() {
            let invocation = Invocation::new(&self.config.tool)
                .args(&self.config.flags)
                .arg(Self::absolute(&object)?)
                .current_dir(&self.work_dir);
            self.runner.run(&invocation)?;
        }

        let mut report = CoverageReport::default();
        for file in matching_files(&self.work_dir, &self.config.discard_glob)? {
            fs::remove_file(&file).map_err(|e| MacrogenError::io(&file, e))?;
            debug!("Discarded {:?}", file);
            report.discarded += 1;
        }

        report.reports = if tidy {
            self.relocate()?
        } else {
            matching_files(&self.work_dir, &self.config.report_glob)?
        };

        info!(
            "Coverage: {} reports kept, {} discarded",
            report.reports.len(),
            report.discarded
        );
        Ok(report)
    }

    /// Moves every report in the work directory into the coverage directory,
    /// replacing reports from earlier runs.
    pub fn relocate(&self) -> Result<Vec<PathBuf>> {
        let target_dir = &self.layout.gcov_dir;
        fs::create_dir_all(target_dir).map_err(|e| MacrogenError::io(target_dir, e))?;

        let mut moved = Vec::new();
        for file in matching_files(&self.work_dir, &self.config.report_glob)? {
            let Some(name) = file.file_name() else {
                continue;
            };
            let destination = target_dir.join(name);
            move_file(&file, &destination)?;
            moved.push(destination);
        }
        Ok(moved)
    }
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // rename fails across filesystems
    fs::copy(from, to).map_err(|e| MacrogenError::io(to, e))?;
    fs::remove_file(from).map_err(|e| MacrogenError::io(from, e))
}
