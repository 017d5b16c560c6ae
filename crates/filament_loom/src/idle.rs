//! Cooperative yielding.
//!
//! The work loop never decides on its own when to stop. It asks a [`Deadline`]
//! how much of the current slice is left after every unit of work and hands
//! control back once that drops under the yield threshold. [`IdleLoop`] plays
//! the part of the platform's idle callback: it keeps handing out fresh slices
//! until the scheduler has nothing left to do.

use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::error::{LoomError, LoomResult};
use crate::host::Host;
use crate::options::SchedulerOptions;
use crate::scheduler::Scheduler;

/// Time budget of one slice.
pub trait Deadline {
    /// Time left in the current slice.
    fn time_remaining(&self) -> Duration;

    /// Whether the slice was granted after a timeout, in which case the
    /// work loop must not yield.
    fn did_timeout(&self) -> bool {
        false
    }
}

/// Wall-clock slice.
#[derive(Debug, Clone, Copy)]
pub struct SliceDeadline {
    started: Instant,
    budget: Duration,
    timed_out: bool,
}

impl SliceDeadline {
    /// Start a slice of `budget` now.
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
            timed_out: false,
        }
    }

    /// Mark the slice as granted after a timeout.
    pub fn timed_out(mut self, timed_out: bool) -> Self {
        self.timed_out = timed_out;
        self
    }

    /// Whether the budget is used up.
    pub fn expired(&self) -> bool {
        self.time_remaining().is_zero()
    }
}

impl Deadline for SliceDeadline {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }

    fn did_timeout(&self) -> bool {
        self.timed_out
    }
}

/// Deterministic slice that lasts exactly `units` units of work.
///
/// Every `time_remaining` call counts as one finished unit; once `units` have
/// been counted the slice reports no time left.
#[derive(Debug)]
pub struct UnitBudget {
    units: usize,
    checks: Cell<usize>,
}

impl UnitBudget {
    /// Create a slice of `units` units.
    pub fn new(units: usize) -> Self {
        Self {
            units,
            checks: Cell::new(0),
        }
    }

    /// Units counted so far.
    pub fn used(&self) -> usize {
        self.checks.get()
    }
}

impl Deadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        let checks = self.checks.get() + 1;
        self.checks.set(checks);
        if checks >= self.units {
            Duration::ZERO
        } else {
            Duration::from_secs(1)
        }
    }
}

/// A slice that never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Host-side driver handing out slices until the scheduler settles.
#[derive(Debug, Clone, Default)]
pub struct IdleLoop {
    options: SchedulerOptions,
}

impl IdleLoop {
    /// Create a driver with the given budgets.
    pub fn new(options: SchedulerOptions) -> Self {
        Self { options }
    }

    /// Run wall-clock slices until no work is pending. Returns the number of
    /// slices used.
    ///
    /// Once `idle_timeout` has elapsed, slices are granted as timed out so the
    /// remaining work finishes without yielding.
    pub fn run<H: Host>(&self, scheduler: &mut Scheduler<H>) -> LoomResult<usize> {
        let started = Instant::now();
        let slice = self.options.slice;
        let idle_timeout = self.options.idle_timeout;
        self.run_with(scheduler, || {
            SliceDeadline::new(slice).timed_out(started.elapsed() >= idle_timeout)
        })
    }

    /// Run slices produced by `next_slice` until no work is pending.
    pub fn run_with<H, D, F>(&self, scheduler: &mut Scheduler<H>, mut next_slice: F) -> LoomResult<usize>
    where
        H: Host,
        D: Deadline,
        F: FnMut() -> D,
    {
        let mut slices = 0;
        while scheduler.has_pending_work() {
            if slices >= self.options.max_slices {
                return Err(LoomError::SliceLimit(self.options.max_slices));
            }
            let deadline = next_slice();
            let status = scheduler.work_loop(&deadline)?;
            slices += 1;
            tracing::trace!(slices, ?status, "idle slice finished");
        }
        Ok(slices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_budget_runs_out_after_units() {
        let budget = UnitBudget::new(2);
        assert!(!budget.time_remaining().is_zero());
        assert!(budget.time_remaining().is_zero());
        assert_eq!(budget.used(), 2);
    }

    #[test]
    fn test_slice_deadline_expires() {
        let deadline = SliceDeadline::new(Duration::ZERO);
        assert!(deadline.expired());
        assert!(!deadline.did_timeout());
        assert!(deadline.timed_out(true).did_timeout());
    }

    #[test]
    fn test_unbounded_never_expires() {
        assert_eq!(Unbounded.time_remaining(), Duration::MAX);
    }
}
