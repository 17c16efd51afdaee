mod cli;
mod commands;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, &cli.log_file)?;

    info!("Molbridge CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let command_result = match cli.command {
        Commands::Call(args) => {
            info!("Dispatching to 'call' command.");
            commands::call::run(args)
        }
        Commands::Toolkits => commands::toolkits::run(),
        Commands::Endpoints => commands::toolkits::list_endpoints(),
    };

    if let Err(e) = &command_result {
        error!("Command failed: {}", e);
    }

    command_result
}
