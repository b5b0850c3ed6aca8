use clap::{CommandFactory, Parser};
use macrogen::cli::Cli;
use macrogen::commands;
use macrogen_core::{MacrogenConfig, Pipeline, Registry, SystemRunner, error::MacrogenError};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v/-q
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    if !cli.has_stage() {
        if let Err(e) = Cli::command().print_help() {
            error!("Failed to print help: {}", e);
        }
        return ExitCode::SUCCESS;
    }

    match execute(&cli) {
        Ok(()) => {
            info!("Macrogen finished successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

fn execute(cli: &Cli) -> Result<(), MacrogenError> {
    debug!("Loading configuration...");
    let config = MacrogenConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let registry = Registry::builtin();
    debug!("Registry holds {} instantiations", registry.len());

    let pipeline = Pipeline::new(config, registry, SystemRunner::new());
    commands::run_stages(cli, &pipeline)
}

fn report(e: &MacrogenError) {
    eprintln!("error: {e}");
    if let Some(output) = e.tool_output() {
        eprintln!("{}", output.trim_end());
    }
}
