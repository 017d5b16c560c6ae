//! Counter command - Mount the click counter and press its button

use std::error::Error;

use clap::Args;

use filament::demos::Counter;
use filament_cloth::{MemoryHost, NodeId};
use filament_loom::Scheduler;

use super::{print_fingerprint, scheduler, settle, CommandResult};
use crate::config::FilamentConfig;

#[derive(Args)]
pub struct CounterArgs {
    /// Number of clicks to dispatch
    #[arg(short, long, default_value = "3")]
    pub clicks: usize,

    /// Value the counter starts at
    #[arg(long, default_value = "0")]
    pub start: i64,

    /// Dispatch every click before rendering once
    #[arg(long)]
    pub batch: bool,
}

pub fn run(args: CounterArgs, config: &FilamentConfig) -> CommandResult {
    let mut scheduler = scheduler(config.scheduler);
    scheduler.render(Counter::element(args.start))?;
    settle(&mut scheduler, "mount")?;

    let button = find_button(&scheduler)?;

    if args.batch {
        for _ in 0..args.clicks {
            scheduler.host().click(button)?;
        }
        settle(&mut scheduler, &format!("click x{}", args.clicks))?;
    } else {
        for click in 1..=args.clicks {
            scheduler.host().click(button)?;
            settle(&mut scheduler, &format!("click {click}"))?;
        }
    }

    print_fingerprint(&scheduler);
    Ok(())
}

fn find_button(scheduler: &Scheduler<MemoryHost>) -> Result<NodeId, Box<dyn Error>> {
    let container = *scheduler.container();
    let button = scheduler
        .host()
        .find_by_tag(container, "button")
        .first()
        .copied()
        .ok_or("the counter rendered no button")?;
    Ok(button)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filament_loom::Element;

    #[test]
    fn test_find_button_in_counter() {
        let scheduler = filament_cloth::mount(Counter::element(0)).unwrap();
        let button = find_button(&scheduler).unwrap();
        assert_eq!(scheduler.host().get(button).unwrap().tag(), Some("button"));
    }

    #[test]
    fn test_missing_button_is_reported() {
        let scheduler = filament_cloth::mount(Element::host("div")).unwrap();
        let err = find_button(&scheduler).unwrap_err();
        assert_eq!(err.to_string(), "the counter rendered no button");
    }
}
