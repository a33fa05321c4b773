//! Sonaris CLI - Forensic Audio Pipeline
//!
//! Command-line interface for the Sonaris forensic audio pipeline.

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use sonaris::cli::{commands, Cli, Commands};
use sonaris::Result;

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("[{}] {}", e.error_code(), e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    info!("Sonaris v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Sonaris v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Info { input } => commands::info(&input),
        Commands::Reconstruct {
            input,
            output,
            phase_gain,
            blend,
        } => commands::reconstruct(&input, &output, phase_gain, blend),
        Commands::Search { input, query, json } => commands::search(&input, &query, json),
        Commands::Transcribe { input } => commands::transcribe(&input),
        Commands::Export { input, output } => commands::export(&input, &output),
    }
}
