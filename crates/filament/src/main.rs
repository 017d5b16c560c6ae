//! # filament
//!
//! Command-line driver for the Filament reconciler.
//!
//! Mounts the bundled demo components into an in-memory render target, drives
//! them through the simulated idle loop and prints what each pass committed.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filament")]
#[command(about = "Interruptible fiber reconciler in Rust", long_about = None)]
#[command(version)]
struct Cli {
    /// Log every scheduling decision to stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./filament.config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount the click counter and press its button (default command)
    Counter(commands::counter::CounterArgs),

    /// Grow or shrink a list through a state update
    List(commands::list::ListArgs),

    /// Print the effective configuration
    Config(commands::config::ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Counter(args)) => commands::counter::run(args, &config),
        Some(Commands::List(args)) => commands::list::run(args, &config),
        Some(Commands::Config(args)) => commands::config::run(args, &config),
        None => commands::counter::run(
            commands::counter::CounterArgs {
                clicks: 3,
                start: 0,
                batch: false,
            },
            &config,
        ),
    };

    if let Err(e) = result {
        eprintln!("\x1b[31mError:\x1b[0m {}", e);
        std::process::exit(1);
    }
}
