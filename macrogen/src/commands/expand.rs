//! Expand command - writes every instantiation's header and source.

use super::SystemPipeline;
use crate::cli::Cli;
use macrogen_core::error::Result;
use tracing::{debug, info};

pub fn run(cli: &Cli, pipeline: &SystemPipeline) -> Result<()> {
    let report = pipeline.expand_all()?;
    println!(
        "Expanded {} instantiations into {} headers and {} sources",
        report.instantiations,
        report.headers().count(),
        report.sources().count()
    );

    if cli.no_format {
        debug!("Skipping formatting of generated files");
        return Ok(());
    }

    info!("Formatting generated files...");
    pipeline.format_generated()?;
    Ok(())
}
