//! The work loop.
//!
//! A [`Scheduler`] owns everything one render target needs: the fiber arena,
//! the component instances, the cursor of the pass in flight and the last
//! committed tree. A pass starts at [`Scheduler::schedule_root`], advances one
//! fiber at a time inside [`Scheduler::work_loop`] and, once the traversal
//! returns to the root, commits in one go.
//!
//! The traversal is depth first: begin a fiber, descend into its first child,
//! and when a leaf is reached complete fibers upward until one with a sibling
//! is found. Completing a fiber splices its effect list into its parent's, so
//! after the root completes its list holds every effect of the pass in
//! completion order.

use std::rc::Rc;

use filament_spool::{CompactString, FxHashSet, SlotMap};

use crate::component::{ComponentSlot, RenderContext, State, StateHandle, UpdateRequests};
use crate::element::{Element, ElementType};
use crate::error::{LoomError, LoomResult};
use crate::fiber::{ComponentId, EffectTag, Fiber, FiberId, Instance, WorkTag};
use crate::host::{self, Host};
use crate::idle::{Deadline, IdleLoop, Unbounded};
use crate::options::SchedulerOptions;
use crate::update_queue::shared_queue;

/// Outcome of one [`Scheduler::work_loop`] slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing was pending
    Idle,
    /// The slice ran out with work left
    Yielded,
    /// A pass finished and was committed
    Committed,
}

/// One committed effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRecord {
    /// Fiber the effect belonged to
    pub fiber: FiberId,
    /// Kind of fiber
    pub tag: WorkTag,
    /// Mutation that was applied
    pub effect: EffectTag,
    /// Tag name, component name, `#text` or `#root`
    pub label: CompactString,
}

/// Statistics of one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassStats {
    /// Fibers visited
    pub units: usize,
    /// Slices the pass was spread over
    pub slices: usize,
    /// Placements and updates, in commit order
    pub effects: Vec<EffectRecord>,
    /// Deletions, in commit order
    pub deleted: Vec<EffectRecord>,
    /// Render-target calls the commit applied
    pub mutations: usize,
}

impl PassStats {
    /// Count committed effects of one kind.
    pub fn count(&self, effect: EffectTag) -> usize {
        self.effects
            .iter()
            .chain(&self.deleted)
            .filter(|record| record.effect == effect)
            .count()
    }

    /// Labels of committed effects of one kind, in commit order.
    pub fn labels(&self, effect: EffectTag) -> Vec<&str> {
        self.effects
            .iter()
            .chain(&self.deleted)
            .filter(|record| record.effect == effect)
            .map(|record| record.label.as_str())
            .collect()
    }
}

/// Scheduling context for one render target.
pub struct Scheduler<H: Host> {
    pub(crate) host: H,
    pub(crate) container: H::Node,
    pub(crate) fibers: SlotMap<FiberId, Fiber<H::Node>>,
    pub(crate) components: SlotMap<ComponentId, ComponentSlot>,
    pub(crate) next_unit_of_work: Option<FiberId>,
    pub(crate) work_in_progress_root: Option<FiberId>,
    pub(crate) current_root: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) requests: Rc<UpdateRequests>,
    pub(crate) options: SchedulerOptions,
    pub(crate) stats: PassStats,
    pub(crate) last_stats: Option<PassStats>,
}

impl<H: Host> Scheduler<H> {
    /// Create a scheduler rendering into `container`.
    pub fn new(host: H, container: H::Node) -> Self {
        Self {
            host,
            container,
            fibers: SlotMap::with_key(),
            components: SlotMap::with_key(),
            next_unit_of_work: None,
            work_in_progress_root: None,
            current_root: None,
            deletions: Vec::new(),
            requests: Rc::default(),
            options: SchedulerOptions::default(),
            stats: PassStats::default(),
            last_stats: None,
        }
    }

    /// Replace the scheduling options.
    pub fn with_options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }

    /// Scheduling options in effect.
    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// The render target.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The render target, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The node everything is mounted into.
    pub fn container(&self) -> &H::Node {
        &self.container
    }

    /// Look up a fiber.
    pub fn fiber(&self, id: FiberId) -> Option<&Fiber<H::Node>> {
        self.fibers.get(id)
    }

    /// Root of the last committed tree.
    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root of the tree under construction.
    pub fn work_in_progress_root(&self) -> Option<FiberId> {
        self.work_in_progress_root
    }

    /// Whether a pass is in flight.
    pub fn is_rendering(&self) -> bool {
        self.work_in_progress_root.is_some()
    }

    /// Whether a pass is in flight or a state update is waiting for one.
    pub fn has_pending_work(&self) -> bool {
        self.next_unit_of_work.is_some()
            || self.work_in_progress_root.is_some()
            || self.requests.pending() > 0
    }

    /// Fibers in the arena, including retained alternates.
    pub fn fiber_count(&self) -> usize {
        self.fibers.len()
    }

    /// Live component instances.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Statistics of the last committed pass.
    pub fn last_pass(&self) -> Option<&PassStats> {
        self.last_stats.as_ref()
    }

    /// Fibers of the committed tree in pre-order.
    pub fn current_fibers(&self) -> Vec<FiberId> {
        let mut order = Vec::new();
        let mut stack: Vec<FiberId> = self.current_root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let Some(fiber) = self.fibers.get(id) else {
                continue;
            };
            order.push(id);
            if let Some(sibling) = fiber.sibling {
                stack.push(sibling);
            }
            if let Some(child) = fiber.child {
                stack.push(child);
            }
        }
        order
    }

    /// Walk the effect list threaded on `id`.
    pub fn effect_list(&self, id: FiberId) -> Vec<FiberId> {
        let mut list = Vec::new();
        let mut cursor = self.fibers.get(id).and_then(|fiber| fiber.first_effect);
        while let Some(effect) = cursor {
            list.push(effect);
            cursor = self.fibers.get(effect).and_then(|fiber| fiber.next_effect);
        }
        list
    }

    /// Component names and states of the committed tree, in pre-order.
    pub fn component_states(&self) -> Vec<(&'static str, &State)> {
        self.current_fibers()
            .into_iter()
            .filter_map(|id| self.fibers.get(id)?.component())
            .filter_map(|slot| self.components.get(slot))
            .map(|slot| (slot.name, &slot.state))
            .collect()
    }

    /// State handle of the component rendered by `fiber`.
    pub fn state_handle(&self, fiber: FiberId) -> Option<StateHandle> {
        let slot = self.fibers.get(fiber)?.component()?;
        self.components.get(slot).map(|slot| slot.handle.clone())
    }

    /// Mount `element` under the container, replacing whatever was rendered.
    ///
    /// This only schedules the pass; drive it with [`Scheduler::work_loop`],
    /// [`Scheduler::flush`] or an [`IdleLoop`].
    pub fn render(&mut self, element: Element) -> LoomResult<()> {
        self.schedule_root(Some(Element::root([element])))
    }

    /// Start a pass from the root.
    ///
    /// With `Some`, the root description replaces the current one. With `None`
    /// the current root is rendered again, picking up queued state updates.
    pub fn schedule_root(&mut self, root: Option<Element>) -> LoomResult<()> {
        if self.work_in_progress_root.is_some() {
            return Err(LoomError::PassInFlight);
        }
        if let Some(element) = &root {
            if element.ty() != &ElementType::Root {
                return Err(LoomError::malformed(format!(
                    "expected the root element, got `{}`",
                    element.ty().name()
                )));
            }
        }

        let wip = match (self.current_root, root) {
            (None, None) => return Err(LoomError::NothingMounted),
            (None, Some(root)) => self
                .fibers
                .insert(Fiber::root(root.shared_props(), self.container.clone())),
            (Some(current), root) => {
                let current_fiber = self.fiber_ref(current)?;
                let props = match root {
                    Some(root) => root.shared_props(),
                    None => Rc::clone(&current_fiber.props),
                };
                let queue = current_fiber.update_queue.clone();
                let stale = current_fiber
                    .alternate
                    .filter(|id| self.fibers.contains_key(*id));

                match stale {
                    Some(stale) => {
                        let fiber = self.fiber_mut(stale)?;
                        fiber.props = props;
                        fiber.alternate = Some(current);
                        if queue.is_some() {
                            fiber.update_queue = queue;
                        }
                        fiber.detach();
                        stale
                    }
                    None => {
                        let mut fiber = Fiber::root(props, self.container.clone());
                        if queue.is_some() {
                            fiber.update_queue = queue;
                        }
                        fiber.alternate = Some(current);
                        let id = self.fibers.insert(fiber);
                        self.fiber_mut(current)?.alternate = Some(id);
                        id
                    }
                }
            }
        };

        let fiber = self.fiber_mut(wip)?;
        fiber.effect_tag = EffectTag::None;
        fiber.reset_effects();

        // Every component is visited from the root, so queued updates are
        // folded into this pass.
        let absorbed = self.requests.take();
        self.deletions.clear();
        self.stats = PassStats::default();
        self.work_in_progress_root = Some(wip);
        self.next_unit_of_work = Some(wip);
        tracing::debug!(root = ?wip, absorbed, "render pass scheduled");
        Ok(())
    }

    /// Run one slice of work.
    ///
    /// Performs at least one unit, then keeps going until the traversal ends
    /// or `deadline` says to yield. A finished traversal is committed before
    /// returning. Any error discards the pass in flight.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> LoomResult<WorkStatus> {
        if self.work_in_progress_root.is_none() {
            let requested = self.requests.take();
            if requested > 0 {
                if self.current_root.is_some() {
                    self.schedule_root(None)?;
                } else {
                    tracing::warn!(requested, "dropping state updates: nothing is mounted");
                }
            }
        }

        if self.next_unit_of_work.is_none() {
            return Ok(WorkStatus::Idle);
        }

        self.stats.slices += 1;
        while let Some(unit) = self.next_unit_of_work {
            match self.perform_unit_of_work(unit) {
                Ok(next) => self.next_unit_of_work = next,
                Err(err) => {
                    self.abort_pass(&err);
                    return Err(err);
                }
            }
            self.stats.units += 1;

            if self.next_unit_of_work.is_some() && self.should_yield(deadline) {
                tracing::trace!(units = self.stats.units, "yielding");
                return Ok(WorkStatus::Yielded);
            }
        }

        if self.work_in_progress_root.is_none() {
            return Ok(WorkStatus::Idle);
        }
        if let Err(err) = self.commit_root() {
            if self.stats.mutations > 0 {
                self.unmount_diverged();
            }
            self.abort_pass(&err);
            return Err(err);
        }
        Ok(WorkStatus::Committed)
    }

    /// Run slices without a time limit until nothing is pending. Returns the
    /// number of slices used.
    pub fn flush(&mut self) -> LoomResult<usize> {
        IdleLoop::new(self.options).run_with(self, || Unbounded)
    }

    fn should_yield(&self, deadline: &dyn Deadline) -> bool {
        !deadline.did_timeout() && deadline.time_remaining() < self.options.yield_threshold
    }

    /// Begin `id`, then pick the next unit: its first child, or the nearest
    /// sibling found while completing upward.
    fn perform_unit_of_work(&mut self, id: FiberId) -> LoomResult<Option<FiberId>> {
        self.begin_work(id)?;
        if let Some(child) = self.fiber_ref(id)?.child {
            return Ok(Some(child));
        }

        let mut cursor = Some(id);
        while let Some(fiber) = cursor {
            self.complete_unit_of_work(fiber)?;
            let fiber = self.fiber_ref(fiber)?;
            if let Some(sibling) = fiber.sibling {
                return Ok(Some(sibling));
            }
            cursor = fiber.return_fiber;
        }
        Ok(None)
    }

    fn begin_work(&mut self, id: FiberId) -> LoomResult<()> {
        let fiber = self.fiber_ref(id)?;
        tracing::trace!(fiber = ?id, ty = fiber.ty.name(), "begin work");
        let tag = fiber.tag;
        match tag {
            WorkTag::Root | WorkTag::HostElement => {
                self.ensure_host_instance(id)?;
                let props = Rc::clone(&self.fiber_ref(id)?.props);
                self.reconcile_children(id, props.children())
            }
            WorkTag::TextElement => self.ensure_host_instance(id),
            WorkTag::ClassComponent => self.update_class_component(id),
        }
    }

    fn ensure_host_instance(&mut self, id: FiberId) -> LoomResult<()> {
        let fiber = self.fiber_ref(id)?;
        if fiber.instance.is_some() {
            return Ok(());
        }
        let ty = fiber.ty.clone();
        let props = Rc::clone(&fiber.props);
        let node = host::create_instance(&mut self.host, &ty, &props)?;
        self.fiber_mut(id)?.instance = Some(Instance::Node(node));
        Ok(())
    }

    fn update_class_component(&mut self, id: FiberId) -> LoomResult<()> {
        let fiber = self.fiber_ref(id)?;
        let props = Rc::clone(&fiber.props);
        let existing = fiber
            .component()
            .filter(|slot| self.components.contains_key(*slot));
        let ElementType::Component(component_ty) = fiber.ty.clone() else {
            return Err(LoomError::malformed(format!(
                "`{}` is not a component",
                fiber.ty.name()
            )));
        };

        let slot_id = match existing {
            Some(slot) => slot,
            None => {
                let instance = component_ty.instantiate(&props);
                let queue = shared_queue();
                let handle = StateHandle::new(Rc::clone(&queue), Rc::clone(&self.requests));
                let state = instance.initial_state();
                let slot = self.components.insert(ComponentSlot {
                    instance,
                    state,
                    fiber: id,
                    handle,
                    name: component_ty.name(),
                });
                let fiber = self.fiber_mut(id)?;
                fiber.instance = Some(Instance::Component(slot));
                fiber.update_queue = Some(queue);
                tracing::trace!(fiber = ?id, component = component_ty.name(), "component created");
                slot
            }
        };

        let queue = self.fiber_ref(id)?.update_queue.clone();
        let slot = self
            .components
            .get_mut(slot_id)
            .ok_or(LoomError::MissingInstance(id))?;
        slot.fiber = id;
        if let Some(queue) = queue {
            let base = std::mem::take(&mut slot.state);
            slot.state = queue.borrow_mut().apply(base);
        }

        let cx = RenderContext::new(&props, &slot.state, &slot.handle);
        let child = slot
            .instance
            .render(&cx)
            .ok_or(LoomError::EmptyRender(slot.name))?;
        self.reconcile_children(id, std::slice::from_ref(&child))
    }

    /// Splice the effect list of `id`, and `id` itself if it carries an
    /// effect, onto the end of its parent's list.
    fn complete_unit_of_work(&mut self, id: FiberId) -> LoomResult<()> {
        let fiber = self.fiber_ref(id)?;
        let Some(parent) = fiber.return_fiber else {
            return Ok(());
        };
        let (first, last, effect) = (fiber.first_effect, fiber.last_effect, fiber.effect_tag);

        if let (Some(first), Some(last)) = (first, last) {
            self.append_effects(parent, first, last)?;
        }
        if effect != EffectTag::None {
            self.append_effects(parent, id, id)?;
        }
        Ok(())
    }

    fn append_effects(&mut self, parent: FiberId, first: FiberId, last: FiberId) -> LoomResult<()> {
        match self.fiber_ref(parent)?.last_effect {
            Some(tail) => self.fiber_mut(tail)?.next_effect = Some(first),
            None => self.fiber_mut(parent)?.first_effect = Some(first),
        }
        self.fiber_mut(parent)?.last_effect = Some(last);
        Ok(())
    }

    /// Throw away the pass in flight. The committed tree stays current.
    pub(crate) fn abort_pass(&mut self, err: &LoomError) {
        for id in std::mem::take(&mut self.deletions) {
            if let Some(fiber) = self.fibers.get_mut(id) {
                fiber.effect_tag = EffectTag::None;
            }
        }
        self.work_in_progress_root = None;
        self.next_unit_of_work = None;
        self.stats = PassStats::default();
        self.sweep();
        tracing::warn!(error = %err, "render pass aborted");
    }

    /// Drop fibers that are neither in the committed tree nor the alternate of
    /// a fiber in it, and components no fiber owns anymore.
    ///
    /// Retained alternates are detached so no stale link is ever followed.
    pub(crate) fn sweep(&mut self) {
        let current = self.current_fibers();
        let mut live: FxHashSet<FiberId> = current.iter().copied().collect();
        for id in current {
            let Some(alternate) = self.fibers.get(id).and_then(|fiber| fiber.alternate) else {
                continue;
            };
            if live.insert(alternate) {
                if let Some(fiber) = self.fibers.get_mut(alternate) {
                    fiber.detach();
                }
            }
        }

        let before = self.fibers.len();
        self.fibers.retain(|id, _| live.contains(&id));
        let owned: FxHashSet<ComponentId> =
            self.fibers.values().filter_map(Fiber::component).collect();
        self.components.retain(|id, slot| {
            let keep = owned.contains(&id);
            if !keep {
                slot.handle.release();
                tracing::trace!(fiber = ?slot.fiber, component = slot.name, "component dropped");
            }
            keep
        });
        tracing::trace!(
            removed = before - self.fibers.len(),
            fibers = self.fibers.len(),
            components = self.components.len(),
            "fibers swept"
        );
    }

    pub(crate) fn fiber_ref(&self, id: FiberId) -> LoomResult<&Fiber<H::Node>> {
        self.fibers.get(id).ok_or(LoomError::UnknownFiber(id))
    }

    pub(crate) fn fiber_mut(&mut self, id: FiberId) -> LoomResult<&mut Fiber<H::Node>> {
        self.fibers.get_mut(id).ok_or(LoomError::UnknownFiber(id))
    }
}
