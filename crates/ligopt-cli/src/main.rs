mod cli;
mod commands;
mod config;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("ligopt CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let device_config = config::resolve_device_config(&cli)?;
    debug!("Resolved device configuration: {:?}", &device_config);

    let command_result = match cli.command {
        Commands::Step(args) => {
            info!("Dispatching to 'step' command.");
            commands::step::run(args, &device_config)
        }
        Commands::Bfgs(args) => {
            info!("Dispatching to 'bfgs' command.");
            commands::bfgs::run(args, &device_config)
        }
    };

    match &command_result {
        Ok(_) => info!("Command completed successfully."),
        Err(e) => error!("Command failed: {}", e),
    }
    command_result
}
