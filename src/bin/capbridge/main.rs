//! capbridge CLI - call the capability contract from the command line

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use capbridge::BridgeError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<BridgeError>() {
            // Already rendered as a full diagnostic
            Some(BridgeError::LinkingUnavailable(diag)) => eprint!("{}", diag.message()),
            _ => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("capbridge=debug")
    } else {
        EnvFilter::new("capbridge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Call(args) => commands::call::execute(args, &cli.backend),
        Commands::List(args) => commands::list::execute(args, &cli.backend),
        Commands::Info(args) => commands::info::execute(args, &cli.backend),
        Commands::Doctor(args) => commands::doctor::execute(args, &cli.backend, cli.verbose),
        Commands::Verify(args) => commands::verify::execute(args, &cli.backend, cli.verbose),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
