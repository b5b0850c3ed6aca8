//! Build command - compiles and links the main or coverage suite.

use super::SystemPipeline;
use crate::cli::Cli;
use macrogen_core::{Target, error::Result};

pub fn run(cli: &Cli, pipeline: &SystemPipeline) -> Result<()> {
    let target = Target::from_coverage(cli.coverage);
    // unformatted code only exists when this invocation expanded it
    let unformatted = cli.expand && cli.no_format;
    let executable = pipeline.build(target, unformatted)?;
    println!("Built {}", executable.display());
    Ok(())
}
