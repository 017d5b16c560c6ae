//! Error types for the reconciler.

use thiserror::Error;

use crate::fiber::FiberId;

/// Errors that abort a render pass.
///
/// None of these are recovered inside the engine. A failed pass leaves the
/// last committed tree untouched, so the next `schedule_root` simply starts
/// over from it.
#[derive(Debug, Error)]
pub enum LoomError {
    /// An element description that cannot be turned into a fiber
    #[error("Malformed element: {0}")]
    MalformedElement(String),

    /// A component returned no element from `render`
    #[error("Component `{0}` rendered nothing")]
    EmptyRender(&'static str),

    /// A fiber link points at a fiber that no longer exists
    #[error("Fiber {0:?} is not in the arena")]
    UnknownFiber(FiberId),

    /// A fiber that must own a render-target node has none
    #[error("Fiber {0:?} has no render-target instance")]
    MissingInstance(FiberId),

    /// No ancestor of the fiber owns a render-target node
    #[error("Fiber {0:?} has no host ancestor to mount into")]
    NoHostParent(FiberId),

    /// `schedule_root` was called while a pass was still in flight
    #[error("A render pass is already in flight")]
    PassInFlight,

    /// A re-render was requested before anything was mounted
    #[error("Nothing is mounted yet; render a root element first")]
    NothingMounted,

    /// The idle loop ran out of slices before the scheduler settled
    #[error("Scheduler did not settle within {0} slices")]
    SliceLimit(usize),

    /// The render target rejected a mutation
    #[error("Render target error: {0}")]
    Host(#[source] Box<dyn std::error::Error + 'static>),
}

impl LoomError {
    pub(crate) fn host<E: std::error::Error + 'static>(err: E) -> Self {
        LoomError::Host(Box::new(err))
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        LoomError::MalformedElement(message.into())
    }
}

/// Result type for reconciler operations.
pub type LoomResult<T> = Result<T, LoomError>;
