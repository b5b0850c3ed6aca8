//! Run command - executes the suite, producing coverage reports when asked.

use super::SystemPipeline;
use crate::cli::Cli;
use macrogen_core::error::Result;

pub fn run(cli: &Cli, pipeline: &SystemPipeline) -> Result<()> {
    if !cli.coverage {
        return pipeline.run();
    }

    let report = pipeline.coverage(!cli.no_tidy)?;
    for path in &report.reports {
        println!("Coverage report {}", path.display());
    }
    Ok(())
}
