//! Stateful components.
//!
//! A component is created once per fiber identity, keeps a [`State`] map, and
//! renders exactly one child element per pass. State changes never touch the
//! fiber tree directly: a [`StateHandle`] appends to the fiber's update queue
//! and asks the scheduler for a new pass from the root.

use std::any::{type_name, TypeId};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use filament_spool::{CompactString, FxHashMap};

use crate::element::{Element, Props, Value};
use crate::fiber::FiberId;
use crate::update_queue::{SharedQueue, StateUpdate};

/// A class-style component.
pub trait Component: 'static {
    /// Construct the instance. Called once per fiber identity.
    fn create(props: &Props) -> Self
    where
        Self: Sized;

    /// State the instance starts with.
    fn initial_state(&self) -> State {
        State::new()
    }

    /// Render one child element. `None` aborts the pass.
    fn render(&self, cx: &RenderContext<'_>) -> Option<Element>;
}

fn create_boxed<C: Component>(props: &Props) -> Box<dyn Component> {
    Box::new(C::create(props))
}

/// Identity of a component type, used to decide reuse during reconciliation.
#[derive(Clone, Copy)]
pub struct ComponentType {
    type_id: TypeId,
    name: &'static str,
    create: fn(&Props) -> Box<dyn Component>,
}

impl ComponentType {
    /// Get the component type of `C`.
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: short_name(type_name::<C>()),
            create: create_boxed::<C>,
        }
    }

    /// Type name without its module path.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn instantiate(&self, props: &Props) -> Box<dyn Component> {
        (self.create)(props)
    }
}

fn short_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.name).finish()
    }
}

/// Component state: a flat key/value map merged shallowly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    fields: FxHashMap<CompactString, Value>,
}

impl State {
    /// Create empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    pub fn with(mut self, key: impl Into<CompactString>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field in place.
    pub fn set(&mut self, key: impl Into<CompactString>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get an integer field.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// Shallow-merge `partial` into this state.
    ///
    /// Fields absent from `partial` are left alone.
    pub fn merge(&mut self, partial: State) {
        self.fields.extend(partial.fields);
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Pending root re-render requests raised by state handles.
#[derive(Debug, Default)]
pub(crate) struct UpdateRequests {
    pending: Cell<usize>,
}

impl UpdateRequests {
    pub(crate) fn request(&self) {
        self.pending.set(self.pending.get() + 1);
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.get()
    }

    pub(crate) fn take(&self) -> usize {
        self.pending.replace(0)
    }
}

/// Component-facing handle for scheduling state changes.
///
/// Once its component is unmounted the handle is inert: updates sent through
/// it are dropped and no pass is requested.
#[derive(Clone)]
pub struct StateHandle {
    queue: SharedQueue,
    requests: Rc<UpdateRequests>,
    mounted: Rc<Cell<bool>>,
}

impl StateHandle {
    pub(crate) fn new(queue: SharedQueue, requests: Rc<UpdateRequests>) -> Self {
        Self {
            queue,
            requests,
            mounted: Rc::new(Cell::new(true)),
        }
    }

    /// Whether the component is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub(crate) fn release(&self) {
        self.mounted.set(false);
        self.queue.borrow_mut().clear();
    }

    /// Merge a partial state on the next pass.
    pub fn set_state(&self, partial: State) {
        self.enqueue(StateUpdate::Partial(partial));
    }

    /// Compute the next partial state from the previous one on the next pass.
    pub fn update(&self, f: impl FnOnce(&State) -> State + 'static) {
        self.enqueue(StateUpdate::Reducer(Box::new(f)));
    }

    /// Number of updates waiting to be applied.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    fn enqueue(&self, update: StateUpdate) {
        if !self.is_mounted() {
            tracing::trace!("state update for an unmounted component dropped");
            return;
        }
        self.queue.borrow_mut().enqueue(update);
        self.requests.request();
        tracing::trace!(pending = self.requests.pending(), "state update queued");
    }
}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandle")
            .field("mounted", &self.is_mounted())
            .field("pending", &self.pending())
            .finish()
    }
}

/// What a component sees while rendering.
pub struct RenderContext<'a> {
    props: &'a Props,
    state: &'a State,
    handle: &'a StateHandle,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(props: &'a Props, state: &'a State, handle: &'a StateHandle) -> Self {
        Self {
            props,
            state,
            handle,
        }
    }

    /// Current props.
    pub fn props(&self) -> &'a Props {
        self.props
    }

    /// State after pending updates were applied.
    pub fn state(&self) -> &'a State {
        self.state
    }

    /// A handle for scheduling state changes, e.g. from listeners.
    pub fn handle(&self) -> StateHandle {
        self.handle.clone()
    }
}

/// A live component instance.
pub(crate) struct ComponentSlot {
    pub(crate) instance: Box<dyn Component>,
    pub(crate) state: State,
    /// Fiber that last rendered this instance.
    pub(crate) fiber: FiberId,
    pub(crate) handle: StateHandle,
    pub(crate) name: &'static str,
}
