//! Config command - Print the effective configuration

use clap::Args;

use super::CommandResult;
use crate::config::FilamentConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Print on one line
    #[arg(long)]
    pub compact: bool,
}

pub fn run(args: ConfigArgs, config: &FilamentConfig) -> CommandResult {
    let json = if args.compact {
        serde_json::to_string(config)?
    } else {
        serde_json::to_string_pretty(config)?
    };
    println!("{json}");
    Ok(())
}
