//! Loom - Interruptible fiber reconciler
//!
//! Turns declarative element trees into the smallest set of mutations against
//! a persistent render target, in a render phase that can stop between any two
//! fibers and pick up exactly where it left off.
//!
//! # Features
//!
//! - **Positional Reconciliation**: Children are compared index by index
//! - **Double Buffering**: Current and work-in-progress fiber generations
//! - **Cooperative Scheduling**: Render work is sliced against a deadline
//! - **Atomic Commit**: Host mutations are applied in one uninterrupted pass
//! - **Queued State**: Component updates fold left to right before rendering
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   schedule_root   ┌───────────────────────────┐
//! │   Element    │ ────────────────▶ │        Work loop          │
//! │ descriptions │                   │ begin ─▶ reconcile ─▶ ... │
//! └──────────────┘                   │ complete (effect list)    │
//!        ▲                           └───────────────────────────┘
//!        │ render                                 │ traversal done
//! ┌──────────────┐   set_state /     ┌───────────────────────────┐
//! │  Components  │ ◀──── update ──── │         Commit            │
//! │ (state queue)│                   │ deletions ─▶ effect list  │
//! └──────────────┘                   └───────────────────────────┘
//!                                                 │
//!                                                 ▼
//!                                    ┌───────────────────────────┐
//!                                    │     Host (render target)  │
//!                                    └───────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use filament_loom::{Element, Scheduler};
//!
//! let mut scheduler = Scheduler::new(host, container);
//! scheduler.render(Element::host("div").child("0"))?;
//! scheduler.flush()?;
//! ```

mod commit;
pub mod component;
pub mod element;
pub mod error;
pub mod fiber;
pub mod host;
pub mod idle;
pub mod options;
mod reconcile;
pub mod scheduler;
pub mod update_queue;

pub use component::{Component, ComponentType, RenderContext, State, StateHandle};
pub use element::{create_element, Child, Element, ElementType, Event, EventHandler, Props, Value};
pub use error::{LoomError, LoomResult};
pub use fiber::{ComponentId, EffectTag, Fiber, FiberId, Instance, WorkTag};
pub use host::Host;
pub use idle::{Deadline, IdleLoop, SliceDeadline, Unbounded, UnitBudget};
pub use options::SchedulerOptions;
pub use scheduler::{EffectRecord, PassStats, Scheduler, WorkStatus};
pub use update_queue::{StateUpdate, UpdateQueue};

/// Loom version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render `element` into `container` and run the first pass to completion.
pub fn mount<H: Host>(element: Element, host: H, container: H::Node) -> LoomResult<Scheduler<H>> {
    let mut scheduler = Scheduler::new(host, container);
    scheduler.render(element)?;
    scheduler.flush()?;
    Ok(scheduler)
}
