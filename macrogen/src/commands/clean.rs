//! Clean command - removes build outputs, optionally the generated trees.

use super::SystemPipeline;
use macrogen_core::error::Result;
use tracing::info;

pub fn run(pipeline: &SystemPipeline, full: bool) -> Result<()> {
    let removed = pipeline.clean(full)?;
    info!("Removed {} entries", removed);
    println!(
        "Cleaned {}",
        if full {
            "build outputs and generated sources"
        } else {
            "build outputs"
        }
    );
    Ok(())
}
