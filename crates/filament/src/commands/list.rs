//! List command - Render a list, then grow or shrink it through a state update

use clap::Args;

use filament::demos::ListDemo;
use filament_loom::{LoomError, State};

use super::{print_fingerprint, scheduler, settle, CommandResult};
use crate::config::FilamentConfig;

#[derive(Args)]
pub struct ListArgs {
    /// Initial number of items
    #[arg(long, default_value = "5")]
    pub from: u32,

    /// Number of items after the update
    #[arg(long, default_value = "2")]
    pub to: u32,
}

pub fn run(args: ListArgs, config: &FilamentConfig) -> CommandResult {
    let mut scheduler = scheduler(config.scheduler);
    scheduler.render(ListDemo::element(i64::from(args.from)))?;
    settle(&mut scheduler, "mount")?;

    let handle = scheduler
        .current_fibers()
        .into_iter()
        .find_map(|id| scheduler.state_handle(id))
        .ok_or(LoomError::NothingMounted)?;
    handle.set_state(State::new().with("len", args.to));
    settle(&mut scheduler, "update")?;

    print_fingerprint(&scheduler);
    Ok(())
}
