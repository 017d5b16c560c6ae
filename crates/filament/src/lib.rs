//! # Filament
//!
//! Interruptible fiber reconciler written in Rust.
//!
//! This crate re-exports all Filament sub-crates for unified documentation,
//! and ships the demo components the `filament` binary runs.
//!
//! ## Crates
//!
//! - [`spool`] - Shared collections and hashing helpers
//! - [`loom`] - Elements, fibers, reconciliation, scheduling and commit
//! - [`cloth`] - In-memory render target

/// Shared collections and hashing helpers.
pub use filament_spool as spool;

/// Elements, fibers, reconciliation, scheduling and commit.
pub use filament_loom as loom;

/// In-memory render target.
pub use filament_cloth as cloth;

pub mod demos;

pub use filament_loom::{mount, Component, Element, LoomError, Scheduler, SchedulerOptions};

/// Filament version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
