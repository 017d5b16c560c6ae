//! Render-target errors.

use thiserror::Error;

use crate::mutation::Op;
use crate::node::NodeId;

/// Errors raised by [`MemoryHost`](crate::MemoryHost).
#[derive(Debug, Error)]
pub enum ClothError {
    /// The handle does not refer to a node
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    /// `remove_child` was given a node that is not a child of `parent`
    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// An element operation was applied to a text node
    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// A text operation was applied to an element
    #[error("Node {0:?} is not a text node")]
    NotAText(NodeId),

    /// A node cannot be appended to itself
    #[error("Node {0:?} cannot contain itself")]
    SelfAppend(NodeId),

    /// Failure requested through `fail_next`
    #[error("Injected failure on {0:?}")]
    Injected(Op),

    /// No listener is registered for the event
    #[error("Node {node:?} has no `{event}` listener")]
    NoListener { node: NodeId, event: String },
}

/// Result type for render-target operations.
pub type ClothResult<T> = Result<T, ClothError>;
