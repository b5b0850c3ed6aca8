//! Every path the pipeline reads or writes, derived from the directory
//! configuration and the registry.

use crate::config::{DirectoryConfig, DriverConfig};
use crate::registry::{FileKind, InstantiationSpec, Registry};
use std::path::{Path, PathBuf};

/// Which hand-written driver a build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The plain test suite.
    Main,
    /// The coverage-instrumented suite.
    Coverage,
}

impl Target {
    pub fn from_coverage(coverage: bool) -> Self {
        if coverage {
            Target::Coverage
        } else {
            Target::Main
        }
    }

    pub fn is_coverage(&self) -> bool {
        matches!(self, Target::Coverage)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryLayout {
    pub output_dir: PathBuf,
    pub include_dir: PathBuf,
    pub src_dir: PathBuf,
    pub unit_test_dir: PathBuf,
    pub library_include_dir: PathBuf,
    pub build_dir: PathBuf,
    pub obj_dir: PathBuf,
    pub gcov_dir: PathBuf,
    pub unit_file: PathBuf,
    library_dirs: Vec<String>,
    drivers: DriverConfig,
}

impl DirectoryLayout {
    pub fn new(dirs: &DirectoryConfig, drivers: &DriverConfig, registry: &Registry) -> Self {
        let output_dir = dirs.output_dir.clone();
        let build_dir = output_dir.join("build");
        Self {
            include_dir: output_dir.join("include"),
            src_dir: output_dir.join("src"),
            unit_test_dir: dirs.unit_test_dir.clone(),
            library_include_dir: dirs.library_include_dir.clone(),
            obj_dir: build_dir.join("obj"),
            gcov_dir: build_dir.join("gcov"),
            unit_file: dirs.unit_file.clone(),
            build_dir,
            output_dir,
            library_dirs: registry.library_dirs(),
            drivers: drivers.clone(),
        }
    }

    /// Directories that must exist before any stage runs, parents first.
    pub fn required_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![
            self.output_dir.clone(),
            self.include_dir.clone(),
            self.src_dir.clone(),
            self.build_dir.clone(),
            self.obj_dir.clone(),
            self.gcov_dir.clone(),
        ];
        for lib in &self.library_dirs {
            dirs.push(self.include_dir.join(lib));
            dirs.push(self.src_dir.join(lib));
            dirs.push(self.obj_dir.join(lib));
        }
        if let Some(parent) = self.unit_file.parent()
            && !parent.as_os_str().is_empty()
            && !dirs.iter().any(|d| d == parent)
        {
            dirs.push(parent.to_path_buf());
        }
        dirs
    }

    /// Root directory of one kind of generated file.
    pub fn generated_root(&self, kind: FileKind) -> &Path {
        match kind {
            FileKind::Header => &self.include_dir,
            FileKind::Source => &self.src_dir,
        }
    }

    /// `<lib>/<name>.h`, as written in `#include` directives.
    pub fn header_include(spec: &InstantiationSpec) -> String {
        format!("{}/{}.h", spec.library_dir(), spec.instance_name)
    }

    pub fn artifact_path(&self, spec: &InstantiationSpec, kind: FileKind) -> PathBuf {
        self.generated_root(kind).join(spec.library_dir()).join(format!(
            "{}.{}",
            spec.instance_name,
            kind.extension()
        ))
    }

    pub fn object_path(&self, spec: &InstantiationSpec) -> PathBuf {
        self.obj_dir
            .join(spec.library_dir())
            .join(format!("{}.o", spec.instance_name))
    }

    fn driver_stem(&self, target: Target) -> &str {
        match target {
            Target::Main => &self.drivers.main,
            Target::Coverage => &self.drivers.coverage,
        }
    }

    /// The hand-written driver source, e.g. `tests/main.c`.
    pub fn driver_source(&self, target: Target) -> PathBuf {
        self.output_dir
            .join(format!("{}.c", self.driver_stem(target)))
    }

    pub fn driver_object(&self, target: Target) -> PathBuf {
        self.obj_dir.join(format!("{}.o", self.driver_stem(target)))
    }

    /// The linked executable, e.g. `tests/main.exe`.
    pub fn executable(&self, target: Target) -> PathBuf {
        self.output_dir
            .join(format!("{}.exe", self.driver_stem(target)))
    }
}
