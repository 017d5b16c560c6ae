//! Subcommands.

pub mod config;
pub mod counter;
pub mod list;

use std::error::Error;

use filament_cloth::MemoryHost;
use filament_loom::{EffectTag, IdleLoop, Scheduler, SchedulerOptions};
use filament_spool::fingerprint_hex;

/// Result of a subcommand.
pub type CommandResult = Result<(), Box<dyn Error>>;

/// A scheduler over a fresh in-memory target.
fn scheduler(options: SchedulerOptions) -> Scheduler<MemoryHost> {
    let mut host = MemoryHost::new();
    let container = host.create_container();
    Scheduler::new(host, container).with_options(options)
}

/// Drive pending work through the idle loop and print the committed output.
fn settle(scheduler: &mut Scheduler<MemoryHost>, label: &str) -> CommandResult {
    let slices = IdleLoop::new(*scheduler.options()).run(scheduler)?;
    let html = scheduler.host().inner_html(*scheduler.container());
    let mutations = scheduler.host_mut().take_mutations().len();

    match scheduler.last_pass() {
        Some(stats) => println!(
            "{label:>8}  {html}\n          {} placed, {} updated, {} deleted, {} mutations, {} units in {} slice(s)",
            stats.count(EffectTag::Placement),
            stats.count(EffectTag::Update),
            stats.count(EffectTag::Deletion),
            mutations,
            stats.units,
            slices,
        ),
        None => println!("{label:>8}  {html}"),
    }
    Ok(())
}

/// Print a stable fingerprint of the committed output.
fn print_fingerprint(scheduler: &Scheduler<MemoryHost>) {
    let html = scheduler.host().inner_html(*scheduler.container());
    println!("fingerprint {}", fingerprint_hex(&html));
}
