//! Stage handlers for the Macrogen CLI.

pub mod build;
pub mod clean;
pub mod expand;
pub mod format;
pub mod run;
pub mod show_config;

use crate::cli::Cli;
use macrogen_core::{Pipeline, SystemRunner, error::Result};
use tracing::debug;

/// The pipeline as the binary drives it: real processes, echoed commands.
pub type SystemPipeline = Pipeline<SystemRunner>;

/// Runs every requested stage in pipeline order.
///
/// `--show-config`, the formatting flags and `--clean-full` end the
/// invocation. Everything else composes: clean, expand, build, run.
pub fn run_stages(cli: &Cli, pipeline: &SystemPipeline) -> Result<()> {
    if cli.show_config {
        show_config::run(pipeline);
        return Ok(());
    }

    if cli.format_source || cli.format_tests {
        return format::run(cli, pipeline);
    }

    if cli.clean_full {
        return clean::run(pipeline, true);
    }

    pipeline.ensure_ready()?;

    if cli.clean {
        clean::run(pipeline, false)?;
    }
    if cli.expand {
        expand::run(cli, pipeline)?;
    }
    if cli.build {
        build::run(cli, pipeline)?;
    }
    if cli.run {
        run::run(cli, pipeline)?;
    }

    debug!("All requested stages finished");
    Ok(())
}
