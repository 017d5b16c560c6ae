//! Cloth - In-memory render target
//!
//! A [`Host`](filament_loom::Host) that keeps its nodes in an arena instead of
//! a real UI toolkit. Every adapter call is logged, so tests and tools can see
//! exactly what a render pass did, and the tree can be serialized to HTML-like
//! text.
//!
//! # Example
//!
//! ```
//! use filament_loom::Element;
//!
//! let scheduler = filament_cloth::mount(Element::host("div").child("0")).unwrap();
//! let host = scheduler.host();
//! assert_eq!(host.inner_html(*scheduler.container()), "<div>0</div>");
//! ```

pub mod error;
pub mod host;
pub mod mutation;
pub mod node;

pub use error::{ClothError, ClothResult};
pub use host::{MemoryHost, TreeWalker};
pub use mutation::{Mutation, Op};
pub use node::{HostNode, NodeId, NodeKind};

use filament_loom::{Element, LoomResult, Scheduler};

/// Render `element` into a fresh [`MemoryHost`] and run the first pass.
pub fn mount(element: Element) -> LoomResult<Scheduler<MemoryHost>> {
    let mut host = MemoryHost::new();
    let container = host.create_container();
    filament_loom::mount(element, host, container)
}
