//! Pending state updates.
//!
//! Each stateful fiber owns a queue of deltas that is folded into the
//! component's state the next time the fiber is visited. The queue is shared
//! between a fiber and its alternate, so handles captured by listeners stay
//! valid across generations.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::component::State;

/// One pending state change.
pub enum StateUpdate {
    /// A partial state merged as-is
    Partial(State),
    /// A function of the accumulated state producing a partial state
    Reducer(Box<dyn FnOnce(&State) -> State>),
}

impl StateUpdate {
    fn resolve(self, state: &State) -> State {
        match self {
            StateUpdate::Partial(partial) => partial,
            StateUpdate::Reducer(f) => f(state),
        }
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateUpdate::Partial(partial) => f.debug_tuple("Partial").field(partial).finish(),
            StateUpdate::Reducer(_) => f.write_str("Reducer(..)"),
        }
    }
}

/// FIFO of pending updates with O(1) append.
#[derive(Default)]
pub struct UpdateQueue {
    pending: VecDeque<StateUpdate>,
}

impl UpdateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an update at the tail.
    pub fn enqueue(&mut self, update: StateUpdate) {
        self.pending.push_back(update);
    }

    /// Fold every pending update into `base`, left to right, and empty the queue.
    ///
    /// With nothing pending this returns `base` unchanged.
    pub fn apply(&mut self, base: State) -> State {
        let mut state = base;
        while let Some(update) = self.pending.pop_front() {
            let partial = update.resolve(&state);
            state.merge(partial);
        }
        state
    }

    /// Drop every pending update.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending updates.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Queue shared by a fiber, its alternate and the component's state handle.
pub type SharedQueue = Rc<RefCell<UpdateQueue>>;

/// Create a fresh shared queue.
pub fn shared_queue() -> SharedQueue {
    Rc::new(RefCell::new(UpdateQueue::new()))
}
