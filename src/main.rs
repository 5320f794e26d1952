//! samplesync CLI entry point.

use clap::Parser;
use samplesync::cli::{self, Cli, Commands, EXIT_ERROR};
use samplesync::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match &cli.command {
        Commands::Init(args) => cli::run_init(args),
        Commands::Run(args) => cli::run_consumer(&cli, args),
        Commands::Check | Commands::Extract | Commands::Inline | Commands::Restore => {
            cli::run_stage(&cli)
        }
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
