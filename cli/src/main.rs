use anyhow::{Context, Result};
use bulkflow::commands::{
    EnhanceArgs, ValidateArgs, render_enhancement_summary, render_validation_summary, run_enhance,
    run_validate,
};
use bulkflow::{config, logger};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "bulkflow", version, about = "Bulk location enhancement and validation")]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an enhancement for every location in an id file
    Enhance(EnhanceArgs),
    /// Check the syntax of every location id in an id file
    Validate(ValidateArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    logger::setup_logger(config.logging()).context("Failed to initialize logger")?;

    match cli.command {
        Command::Enhance(args) => {
            let result = run_enhance(&config, &args).await?;
            print!("{}", render_enhancement_summary(&result));
            log::info!("{}", result.summary());
            if result.is_complete_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Validate(args) => {
            let outcome = run_validate(&config, &args).await?;
            print!("{}", render_validation_summary(&outcome));
            if outcome.all_valid() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
