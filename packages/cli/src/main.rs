mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{address, hierarchy, init, redo, scan, serve, undo, HierarchyArgs, InitArgs, ServeArgs};
use tracing_subscriber::EnvFilter;

/// ecu - hierarchy addressing and structural editing for JSX/TSX projects
#[derive(Parser, Debug)]
#[command(name = "ecu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an ecu.config.json
    Init(InitArgs),

    /// Start the HTTP API
    Serve(ServeArgs),

    /// Scan the project and list its components
    Scan,

    /// Write hierarchy addresses into every component
    Address,

    /// Resolve a hierarchy path and print the route and children
    Hierarchy(HierarchyArgs),

    /// Undo the latest change
    Undo,

    /// Redo the latest undone change
    Redo,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Serve(args) => serve(args, &cwd),
            Command::Scan => scan(&cwd),
            Command::Address => address(&cwd),
            Command::Hierarchy(args) => hierarchy(args, &cwd),
            Command::Undo => undo(&cwd),
            Command::Redo => redo(&cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
