// Macrogen - generated test sources and builds for macro-based C collections

// Configuration and catalogue
pub mod config;
pub mod error;
pub mod layout;
pub mod registry;

// Generation
pub mod expander;
pub mod synth;
pub mod writer;

// Toolchain
pub mod clean;
pub mod coverage;
pub mod formatter;
pub mod guard;
pub mod orchestrator;
pub mod runner;

pub mod pipeline;

// Re-export commonly used items for convenience
pub use config::MacrogenConfig;
pub use error::{MacrogenError, Result};
pub use layout::{DirectoryLayout, Target};
pub use pipeline::{ExpansionReport, Pipeline};
pub use registry::{CollectionKind, FileKind, InstantiationSpec, Registry};
pub use runner::{CommandRunner, Invocation, SystemRunner};

/// Expands every built-in instantiation with the given configuration.
///
/// # Example
///
/// ```ignore
/// use macrogen_core::{MacrogenConfig, expand_with_config};
///
/// let config = MacrogenConfig::load(None)?;
/// let report = expand_with_config(config)?;
/// println!("Generated {} files", report.files.len());
/// ```
pub fn expand_with_config(config: MacrogenConfig) -> Result<ExpansionReport> {
    config.validate()?;
    Pipeline::new(config, Registry::builtin(), SystemRunner::new()).expand_all()
}
