//! Positional child reconciliation.
//!
//! New child descriptions are compared with the previous generation's
//! children strictly by index. Same type at the same position reuses the old
//! fiber's instance; anything else is a fresh placement plus a deletion of
//! whatever stood there before.

use std::rc::Rc;

use crate::element::Element;
use crate::error::LoomResult;
use crate::fiber::{EffectTag, Fiber, FiberId, WorkTag};
use crate::host::{self, Host};
use crate::scheduler::Scheduler;
use crate::update_queue::shared_queue;

impl<H: Host> Scheduler<H> {
    /// Rebuild the child list of the work-in-progress fiber `parent` from
    /// `elements`.
    pub(crate) fn reconcile_children(
        &mut self,
        parent: FiberId,
        elements: &[Element],
    ) -> LoomResult<()> {
        let mut old = match self.fiber_ref(parent)?.alternate {
            Some(alternate) => self.fibers.get(alternate).and_then(|fiber| fiber.child),
            None => None,
        };
        self.fiber_mut(parent)?.child = None;

        let mut prev: Option<FiberId> = None;
        let mut index = 0;
        while index < elements.len() || old.is_some() {
            let element = elements.get(index);
            if let Some(element) = element {
                validate(element)?;
            }
            let next_old = match old {
                Some(id) => self.fiber_ref(id)?.sibling,
                None => None,
            };
            let same_type = match (old, element) {
                (Some(id), Some(element)) => self.fiber_ref(id)?.ty == *element.ty(),
                _ => false,
            };

            let fiber = match (old, element) {
                (Some(old), Some(element)) if same_type => {
                    Some(self.reuse_fiber(old, element, parent)?)
                }
                (old, Some(element)) => {
                    let placed = self.place_fiber(element, parent)?;
                    if let Some(old) = old {
                        self.delete_fiber(old)?;
                    }
                    Some(placed)
                }
                (Some(old), None) => {
                    self.delete_fiber(old)?;
                    None
                }
                (None, None) => None,
            };

            if let Some(fiber) = fiber {
                match prev {
                    Some(prev) => self.fiber_mut(prev)?.sibling = Some(fiber),
                    None => self.fiber_mut(parent)?.child = Some(fiber),
                }
                prev = Some(fiber);
            }

            old = next_old;
            index += 1;
        }
        Ok(())
    }

    /// Produce the next generation of `old` carrying the props of `element`.
    ///
    /// The previous alternate of `old` is recycled when there is one,
    /// otherwise a new fiber is allocated and paired with `old`.
    fn reuse_fiber(&mut self, old: FiberId, element: &Element, parent: FiberId) -> LoomResult<FiberId> {
        let previous = self.fiber_ref(old)?;
        let tag = previous.tag;
        let instance = previous.instance.clone();
        let queue = previous.update_queue.clone().unwrap_or_else(shared_queue);
        let stale = previous
            .alternate
            .filter(|id| self.fibers.contains_key(*id));
        let props = element.shared_props();

        let id = match stale {
            Some(stale) => stale,
            None => {
                let id = self
                    .fibers
                    .insert(Fiber::new(tag, element.ty().clone(), Rc::clone(&props)));
                self.fiber_mut(old)?.alternate = Some(id);
                id
            }
        };

        let fiber = self.fiber_mut(id)?;
        fiber.tag = tag;
        fiber.ty = element.ty().clone();
        fiber.props = props;
        fiber.instance = instance;
        fiber.alternate = Some(old);
        fiber.update_queue = Some(queue);
        fiber.detach();
        fiber.return_fiber = Some(parent);
        fiber.effect_tag = EffectTag::Update;
        tracing::trace!(fiber = ?id, alternate = ?old, recycled = stale.is_some(), "update");
        Ok(id)
    }

    fn place_fiber(&mut self, element: &Element, parent: FiberId) -> LoomResult<FiberId> {
        let tag = WorkTag::for_child(element.ty())?;
        let mut fiber = Fiber::new(tag, element.ty().clone(), element.shared_props());
        fiber.return_fiber = Some(parent);
        fiber.effect_tag = EffectTag::Placement;
        fiber.update_queue = Some(shared_queue());
        let id = self.fibers.insert(fiber);
        tracing::trace!(fiber = ?id, ty = element.ty().name(), "placement");
        Ok(id)
    }

    fn delete_fiber(&mut self, old: FiberId) -> LoomResult<()> {
        self.fiber_mut(old)?.effect_tag = EffectTag::Deletion;
        self.deletions.push(old);
        tracing::trace!(fiber = ?old, "deletion");
        Ok(())
    }
}

fn validate(element: &Element) -> LoomResult<()> {
    if WorkTag::for_child(element.ty())? == WorkTag::TextElement {
        host::text_of(element.props())?;
    }
    Ok(())
}
