mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{bake, init, inspect, repair, BakeArgs, InitArgs, InspectArgs, RepairArgs};

/// FreeForm CLI - inspect and maintain saved FreeForm site documents
#[derive(Parser, Debug)]
#[command(name = "freeform")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file and a starter document
    Init(InitArgs),

    /// Summarize saved documents
    Inspect(InspectArgs),

    /// Load a document through the repair pass and write it back
    Repair(RepairArgs),

    /// Store derived tablet or mobile geometry for every element
    Bake(BakeArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("{} cannot read current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Inspect(args) => inspect(args, &cwd),
        Command::Repair(args) => repair(args, &cwd),
        Command::Bake(args) => bake(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
