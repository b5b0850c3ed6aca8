//! Command-line interface definitions for Macrogen.

use clap::Parser;
use std::path::PathBuf;

/// Macrogen - expands C macro-collection instantiations into real sources,
/// then builds, runs and measures the test suite
#[derive(Parser, Debug, Default)]
#[command(name = "macrogen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to macrogen.toml configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration and registry, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Delete build outputs
    #[arg(long)]
    pub clean: bool,

    /// Delete build outputs and the generated include and source trees, then exit
    #[arg(long)]
    pub clean_full: bool,

    /// Expand every registered instantiation into header and source files
    #[arg(short, long)]
    pub expand: bool,

    /// Skip formatting the expanded files
    #[arg(long)]
    pub no_format: bool,

    /// Compile and link the test executable
    #[arg(short, long)]
    pub build: bool,

    /// Build or run the coverage-instrumented suite
    #[arg(long)]
    pub coverage: bool,

    /// Run the test executable
    #[arg(short, long)]
    pub run: bool,

    /// Keep coverage reports where the report tool wrote them
    #[arg(long)]
    pub no_tidy: bool,

    /// Format the library sources, then exit
    #[arg(long)]
    pub format_source: bool,

    /// Format the test tree, then exit
    #[arg(long)]
    pub format_tests: bool,

    /// Enable verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Whether any pipeline stage was requested.
    pub fn has_stage(&self) -> bool {
        self.show_config
            || self.clean
            || self.clean_full
            || self.expand
            || self.build
            || self.run
            || self.format_source
            || self.format_tests
    }
}
