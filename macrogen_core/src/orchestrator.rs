//! Compiles generated sources and the driver, links the test executable and
//! runs it.

use crate::config::CompilerConfig;
use crate::error::{MacrogenError, Result};
use crate::guard::require_file;
use crate::layout::{DirectoryLayout, Target};
use crate::registry::{FileKind, Registry};
use crate::runner::{CommandRunner, Invocation};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct BuildOrchestrator<'a, R: CommandRunner> {
    runner: &'a R,
    layout: &'a DirectoryLayout,
    registry: &'a Registry,
    compiler: &'a CompilerConfig,
    extra_cflags: Vec<String>,
}

impl<'a, R: CommandRunner> BuildOrchestrator<'a, R> {
    pub fn new(
        runner: &'a R,
        layout: &'a DirectoryLayout,
        registry: &'a Registry,
        compiler: &'a CompilerConfig,
    ) -> Self {
        Self {
            runner,
            layout,
            registry,
            compiler,
            extra_cflags: Vec::new(),
        }
    }

    /// Appends flags to every compile step.
    pub fn with_extra_cflags(mut self, flags: impl IntoIterator<Item = String>) -> Self {
        self.extra_cflags.extend(flags);
        self
    }

    /// Compile flags for a target.
    ///
    /// Coverage builds drop every optimization flag and add the coverage
    /// flags, which carry their own `-O0`.
    pub fn compile_flags(&self, target: Target) -> Vec<String> {
        let mut flags: Vec<String> = if target.is_coverage() {
            self.compiler
                .cflags
                .iter()
                .filter(|f| !f.starts_with("-O"))
                .chain(&self.compiler.coverage_flags)
                .cloned()
                .collect()
        } else {
            self.compiler.cflags.clone()
        };
        flags.extend(self.extra_cflags.iter().cloned());
        flags
    }

    /// Placed after the objects so `-l` libraries resolve against them.
    fn link_flags(&self, target: Target) -> Vec<String> {
        let mut flags = self.compiler.lflags.clone();
        if target.is_coverage() {
            flags.extend(self.compiler.coverage_flags.iter().cloned());
        }
        flags
    }

    /// Generated headers first so they shadow anything of the same name in
    /// the hand-written trees.
    fn include_dirs(&self) -> [&Path; 3] {
        [
            &self.layout.include_dir,
            &self.layout.unit_test_dir,
            &self.layout.library_include_dir,
        ]
    }

    fn compile(&self, target: Target, source: &Path, object: &Path) -> Result<()> {
        if let Some(parent) = object.parent() {
            fs::create_dir_all(parent).map_err(|e| MacrogenError::io(parent, e))?;
        }
        let invocation = Invocation::new(&self.compiler.cc)
            .args(self.compile_flags(target))
            .includes(self.include_dirs())
            .arg("-c")
            .arg(source.as_os_str())
            .arg("-o")
            .arg(object.as_os_str());
        self.runner.run(&invocation)
    }

    /// Verifies that the driver and every generated source exist.
    ///
    /// Runs before the compiler is touched so a missing expansion reports
    /// the absent file instead of a compiler error.
    pub fn require_inputs(&self, target: Target) -> Result<()> {
        require_file(&self.layout.driver_source(target))?;
        for spec in self.registry {
            require_file(&self.layout.artifact_path(spec, FileKind::Source))?;
        }
        Ok(())
    }

    /// Objects in link order: driver first, then registry order.
    pub fn link_objects(&self, target: Target) -> Vec<PathBuf> {
        std::iter::once(self.layout.driver_object(target))
            .chain(self.registry.iter().map(|s| self.layout.object_path(s)))
            .collect()
    }

    /// Compiles every generated source and the driver, then links them.
    /// Returns the path of the linked executable.
    pub fn compile_all(&self, target: Target) -> Result<PathBuf> {
        self.require_inputs(target)?;
        info!(
            "Compiling {} instantiations for {:?} target",
            self.registry.len(),
            target
        );

        for spec in self.registry {
            let source = self.layout.artifact_path(spec, FileKind::Source);
            let object = self.layout.object_path(spec);
            debug!("Compiling {:?} -> {:?}", source, object);
            self.compile(target, &source, &object)?;
        }

        self.compile(
            target,
            &self.layout.driver_source(target),
            &self.layout.driver_object(target),
        )?;

        let executable = self.layout.executable(target);
        let link = Invocation::new(&self.compiler.cc)
            .arg("-o")
            .arg(executable.as_os_str())
            .args(self.link_objects(target))
            .args(self.link_flags(target));
        self.runner.run(&link)?;

        info!("Linked {:?}", executable);
        Ok(executable)
    }

    /// Runs the linked executable. Its exit status is the suite's verdict and
    /// is propagated as is.
    pub fn run(&self, target: Target) -> Result<()> {
        let executable = self.layout.executable(target);
        require_file(&executable)?;
        let program = std::path::absolute(&executable).map_err(|e| MacrogenError::io(&executable, e))?;
        info!("Running {:?}", program);
        self.runner.run(&Invocation::new(program))
    }
}
