//! Stage entry points shared by the command line and library users.

use crate::clean::Cleaner;
use crate::config::MacrogenConfig;
use crate::coverage::{CoverageReport, CoverageRunner};
use crate::error::Result;
use crate::expander::MacroExpander;
use crate::formatter::Formatter;
use crate::guard;
use crate::layout::{DirectoryLayout, Target};
use crate::orchestrator::BuildOrchestrator;
use crate::registry::{FileKind, Registry};
use crate::runner::CommandRunner;
use crate::synth::UnitSynthesizer;
use crate::writer::{ArtifactWriter, GeneratedFile};
use std::path::PathBuf;
use tracing::{debug, info};

/// Suppresses the warning the formatter would otherwise fix in unformatted
/// generated code.
pub const UNFORMATTED_CFLAG: &str = "-Wno-misleading-indentation";

/// Report of one expansion pass.
#[derive(Debug, Clone, Default)]
pub struct ExpansionReport {
    /// Files written, all headers first, then all sources.
    pub files: Vec<GeneratedFile>,
    /// Number of instantiations processed.
    pub instantiations: usize,
}

impl ExpansionReport {
    pub fn headers(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter().filter(|f| f.kind == FileKind::Header)
    }

    pub fn sources(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter().filter(|f| f.kind == FileKind::Source)
    }
}

pub struct Pipeline<R: CommandRunner> {
    config: MacrogenConfig,
    registry: Registry,
    layout: DirectoryLayout,
    runner: R,
    work_dir: PathBuf,
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(config: MacrogenConfig, registry: Registry, runner: R) -> Self {
        let layout = DirectoryLayout::new(&config.directories, &config.drivers, &registry);
        Self {
            config,
            registry,
            layout,
            runner,
            work_dir: PathBuf::from("."),
        }
    }

    /// Directory coverage reports are produced in and cleaned from.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn config(&self) -> &MacrogenConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn ensure_ready(&self) -> Result<()> {
        guard::ensure_ready(&self.layout)
    }

    /// Expands every instantiation's header, then every source, and writes
    /// them into the generated trees. The first failure stops the pass.
    pub fn expand_all(&self) -> Result<ExpansionReport> {
        info!(
            "Starting expansion of {} instantiations",
            self.registry.len()
        );
        guard::require_executable(&self.config.compiler.cc)?;
        self.ensure_ready()?;

        let synth = UnitSynthesizer::new(self.config.expansion.clone());
        let expander = MacroExpander::new(
            &self.runner,
            &self.config.compiler.cc,
            &self.config.expansion,
            &self.layout.library_include_dir,
            &self.layout.unit_file,
        )?;
        let writer =
            ArtifactWriter::new(&self.layout, self.config.expansion.umbrella_header.as_deref());

        let mut report = ExpansionReport {
            files: Vec::with_capacity(self.registry.len() * FileKind::ORDER.len()),
            instantiations: self.registry.len(),
        };
        for kind in FileKind::ORDER {
            for spec in &self.registry {
                let unit = synth.synthesize(spec, kind);
                let code = expander.expand(spec, kind, &unit)?;
                report.files.push(writer.write(spec, kind, &code)?);
            }
        }

        info!("Expansion complete. Generated {} files", report.files.len());
        Ok(report)
    }

    pub fn formatter(&self) -> Formatter<'_, R> {
        Formatter::new(&self.runner, &self.config.formatter)
    }

    pub fn format_generated(&self) -> Result<usize> {
        guard::require_executable(&self.config.formatter.program)?;
        self.formatter().format_generated(&self.layout)
    }

    pub fn format_library(&self) -> Result<usize> {
        guard::require_executable(&self.config.formatter.program)?;
        self.formatter().format_library(&self.layout)
    }

    pub fn format_tests(&self) -> Result<usize> {
        guard::require_executable(&self.config.formatter.program)?;
        self.formatter().format_tests(&self.layout)
    }

    fn orchestrator(&self, unformatted: bool) -> BuildOrchestrator<'_, R> {
        let extra = unformatted.then(|| UNFORMATTED_CFLAG.to_string());
        BuildOrchestrator::new(
            &self.runner,
            &self.layout,
            &self.registry,
            &self.config.compiler,
        )
        .with_extra_cflags(extra)
    }

    /// Compiles and links `target`. `unformatted` is set when the generated
    /// code skipped formatting in this invocation.
    pub fn build(&self, target: Target, unformatted: bool) -> Result<PathBuf> {
        let orchestrator = self.orchestrator(unformatted);
        orchestrator.require_inputs(target)?;
        guard::require_executable(&self.config.compiler.cc)?;
        self.ensure_ready()?;
        orchestrator.compile_all(target)
    }

    /// Runs the main suite.
    pub fn run(&self) -> Result<()> {
        self.orchestrator(false).run(Target::Main)
    }

    /// Runs the coverage suite and produces reports.
    pub fn coverage(&self, tidy: bool) -> Result<CoverageReport> {
        guard::require_executable(&self.config.coverage.tool)?;
        CoverageRunner::new(
            &self.runner,
            &self.layout,
            &self.registry,
            &self.config.coverage,
        )
        .with_work_dir(&self.work_dir)
        .run(tidy)
    }

    pub fn clean(&self, full: bool) -> Result<usize> {
        debug!("Cleaning (full: {})", full);
        Cleaner::new(&self.layout, &self.work_dir).clean(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CollectionKind, InstantiationSpec};
    use crate::runner::RecordingRunner;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const SENTINEL: &str = "// C_MACRO_COLLECTIONS_CODE";

    fn registry() -> Registry {
        Registry::from_specs(vec![
            InstantiationSpec {
                library: "CMC",
                collection_kind: CollectionKind::Deque,
                prefix: "d",
                instance_name: "deque",
                size_param: "",
                key_type: "",
                val_type: "size_t",
                template_header: "cmc/deque.h",
            },
            InstantiationSpec {
                library: "CMC",
                collection_kind: CollectionKind::Heap,
                prefix: "h",
                instance_name: "heap",
                size_param: "",
                key_type: "",
                val_type: "size_t",
                template_header: "cmc/heap.h",
            },
        ])
        .unwrap()
    }

    /// `sh` stands in for the compiler so the executable check passes.
    fn pipeline(root: &std::path::Path) -> Pipeline<RecordingRunner> {
        let mut config = MacrogenConfig::default();
        config.compiler.cc = "sh".to_string();
        config.directories.output_dir = root.join("tests");
        config.directories.unit_file = root.join("tests/build/unit.c");
        Pipeline::new(config, registry(), RecordingRunner::default()).with_work_dir(root)
    }

    #[cfg(unix)]
    #[test]
    fn test_expand_all_headers_then_sources() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = pipeline(temp_dir.path());
        for code in ["d_h", "h_h", "d_c", "h_c"] {
            pipeline
                .runner()
                .queue_output(&format!("{SENTINEL}\n{code};\n{SENTINEL}\n"));
        }

        let report = pipeline.expand_all().unwrap();
        assert_eq!(report.instantiations, 2);
        assert_eq!(report.headers().count(), 2);
        assert_eq!(report.sources().count(), 2);

        let layout = pipeline.layout();
        let deque = pipeline.registry().find("deque").unwrap();
        let heap = pipeline.registry().find("heap").unwrap();
        let paths: Vec<_> = report.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                layout.artifact_path(deque, FileKind::Header),
                layout.artifact_path(heap, FileKind::Header),
                layout.artifact_path(deque, FileKind::Source),
                layout.artifact_path(heap, FileKind::Source),
            ]
        );
        let heap_source =
            fs::read_to_string(layout.artifact_path(heap, FileKind::Source)).unwrap();
        assert_eq!(heap_source, "#include \"cmc/heap.h\"\n\nh_c;\n");
        assert!(!layout.unit_file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_expand_all_stops_at_first_failure() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = pipeline(temp_dir.path());
        pipeline
            .runner()
            .queue_output(&format!("{SENTINEL}\nd_h;\n{SENTINEL}\n"));
        pipeline.runner().queue_output("fatal error: no such header");

        let err = pipeline.expand_all().unwrap_err();
        assert!(err.to_string().contains("'heap'"));
        assert_eq!(pipeline.runner().recorded().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_build_without_driver_reports_driver() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = pipeline(temp_dir.path());
        let err = pipeline.build(Target::Main, false).unwrap_err();
        assert!(err.to_string().contains("main.c"));
        assert!(pipeline.runner().recorded().is_empty());
    }

    #[test]
    fn test_unformatted_build_adds_warning_suppression() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = pipeline(temp_dir.path());
        assert!(pipeline
            .orchestrator(true)
            .compile_flags(Target::Main)
            .contains(&UNFORMATTED_CFLAG.to_string()));
        assert!(!pipeline
            .orchestrator(false)
            .compile_flags(Target::Main)
            .contains(&UNFORMATTED_CFLAG.to_string()));
    }
}
