//! Format command - formats hand-written library sources and the test tree.

use super::SystemPipeline;
use crate::cli::Cli;
use macrogen_core::error::Result;

pub fn run(cli: &Cli, pipeline: &SystemPipeline) -> Result<()> {
    if cli.format_source {
        let count = pipeline.format_library()?;
        println!("Formatted {count} library files");
    }
    if cli.format_tests {
        let count = pipeline.format_tests()?;
        println!("Formatted {count} test files");
    }
    Ok(())
}
