//! Commit phase.
//!
//! Runs to completion once started: deletions first, then the effect list of
//! the work-in-progress root in completion order. Afterwards that root becomes
//! the current tree.
//!
//! If a render-target call fails after others were applied, the target no
//! longer matches either generation. Everything mounted under the container
//! is then removed and the next pass mounts from scratch.

use std::rc::Rc;

use filament_spool::CompactString;

use crate::element::Props;
use crate::error::{LoomError, LoomResult};
use crate::fiber::{EffectTag, FiberId, WorkTag};
use crate::host::{self, Host};
use crate::scheduler::{EffectRecord, Scheduler};

impl<H: Host> Scheduler<H> {
    pub(crate) fn commit_root(&mut self) -> LoomResult<()> {
        let Some(root) = self.work_in_progress_root else {
            return Ok(());
        };

        for index in 0..self.deletions.len() {
            let id = self.deletions[index];
            let record = self.record(id)?;
            let parent = self.host_parent_node(id)?;
            self.commit_deletion(id, &parent)?;
            self.fiber_mut(id)?.effect_tag = EffectTag::None;
            self.stats.deleted.push(record);
        }

        let mut cursor = self.fiber_ref(root)?.first_effect;
        while let Some(id) = cursor {
            let record = self.record(id)?;
            self.commit_work(id)?;
            self.stats.effects.push(record);
            cursor = self.fiber_ref(id)?.next_effect;
        }

        self.deletions.clear();
        self.current_root = Some(root);
        self.work_in_progress_root = None;
        self.next_unit_of_work = None;
        let stats = std::mem::take(&mut self.stats);
        tracing::debug!(
            units = stats.units,
            slices = stats.slices,
            placements = stats.count(EffectTag::Placement),
            updates = stats.count(EffectTag::Update),
            deletions = stats.count(EffectTag::Deletion),
            mutations = stats.mutations,
            "render pass committed"
        );
        self.last_stats = Some(stats);
        self.sweep();
        Ok(())
    }

    /// Remove the top-level nodes of both generations from the container and
    /// forget the committed tree.
    ///
    /// Nodes that are no longer attached there are skipped.
    pub(crate) fn unmount_diverged(&mut self) {
        let mut nodes: Vec<H::Node> = Vec::new();
        for root in [self.current_root, self.work_in_progress_root].into_iter().flatten() {
            let mut child = self.fibers.get(root).and_then(|fiber| fiber.child);
            while let Some(id) = child {
                self.collect_host_nodes(id, &mut nodes);
                child = self.fibers.get(id).and_then(|fiber| fiber.sibling);
            }
        }

        let container = self.container.clone();
        let mut removed = 0;
        for node in &nodes {
            match self.host.remove_child(&container, node) {
                Ok(()) => removed += 1,
                Err(err) => tracing::trace!(?node, error = %err, "node already detached"),
            }
        }

        self.current_root = None;
        tracing::warn!(removed, "render target diverged from the committed tree, unmounted");
    }

    /// Topmost render-target nodes at or below `id`, looking through components.
    fn collect_host_nodes(&self, id: FiberId, nodes: &mut Vec<H::Node>) {
        let Some(fiber) = self.fibers.get(id) else {
            return;
        };
        if fiber.tag.is_host_node() {
            if let Some(node) = fiber.node() {
                if !nodes.contains(node) {
                    nodes.push(node.clone());
                }
            }
            return;
        }
        let mut child = fiber.child;
        while let Some(id) = child {
            self.collect_host_nodes(id, nodes);
            child = self.fibers.get(id).and_then(|fiber| fiber.sibling);
        }
    }

    fn record(&self, id: FiberId) -> LoomResult<EffectRecord> {
        let fiber = self.fiber_ref(id)?;
        Ok(EffectRecord {
            fiber: id,
            tag: fiber.tag,
            effect: fiber.effect_tag,
            label: CompactString::from(fiber.ty.name()),
        })
    }

    fn commit_work(&mut self, id: FiberId) -> LoomResult<()> {
        let fiber = self.fiber_ref(id)?;
        let (effect, tag) = (fiber.effect_tag, fiber.tag);
        tracing::trace!(fiber = ?id, ?effect, "commit");
        match effect {
            EffectTag::None => return Ok(()),
            // A placed component only has placed descendants, which mount
            // themselves.
            EffectTag::Placement if tag == WorkTag::ClassComponent => {}
            EffectTag::Placement => self.commit_placement(id)?,
            EffectTag::Update => self.commit_update(id)?,
            EffectTag::Deletion => {
                let parent = self.host_parent_node(id)?;
                self.commit_deletion(id, &parent)?;
            }
        }
        self.fiber_mut(id)?.effect_tag = EffectTag::None;
        Ok(())
    }

    /// Append the node of `id` to its host parent, then move the nodes that
    /// must follow it behind it.
    fn commit_placement(&mut self, id: FiberId) -> LoomResult<()> {
        let parent = self.host_parent_node(id)?;
        let node = self.host_node_below(id)?;
        self.host
            .append_child(&parent, &node)
            .map_err(LoomError::host)?;
        self.stats.mutations += 1;

        for follower in self.following_nodes(id)? {
            self.host
                .append_child(&parent, &follower)
                .map_err(LoomError::host)?;
            self.stats.mutations += 1;
        }
        Ok(())
    }

    /// Nodes of the siblings after `id` under the same host parent that are
    /// already attached, in order.
    ///
    /// Siblings still waiting for their own placement are skipped; they are
    /// appended later in the pass.
    fn following_nodes(&self, id: FiberId) -> LoomResult<Vec<H::Node>> {
        let mut nodes = Vec::new();
        let mut cursor = id;
        loop {
            let fiber = self.fiber_ref(cursor)?;
            let mut sibling = fiber.sibling;
            while let Some(next) = sibling {
                let host_fiber = self.fiber_ref(self.host_fiber_below(next)?)?;
                if host_fiber.effect_tag != EffectTag::Placement {
                    nodes.push(self.host_node_below(next)?);
                }
                sibling = self.fiber_ref(next)?.sibling;
            }
            match fiber.return_fiber {
                Some(parent) if !self.fiber_ref(parent)?.tag.is_host_parent() => cursor = parent,
                _ => return Ok(nodes),
            }
        }
    }

    fn commit_update(&mut self, id: FiberId) -> LoomResult<()> {
        let fiber = self.fiber_ref(id)?;
        let previous = fiber.alternate.and_then(|alternate| self.fibers.get(alternate));
        let tag = fiber.tag;
        match tag {
            WorkTag::TextElement => {
                let node = fiber.node().cloned().ok_or(LoomError::MissingInstance(id))?;
                let text = host::text_of(&fiber.props)?;
                let old_text = previous.and_then(|previous| previous.props.text());
                if old_text.as_deref() != Some(text.as_str()) {
                    self.host.set_text(&node, &text).map_err(LoomError::host)?;
                    self.stats.mutations += 1;
                }
            }
            WorkTag::HostElement => {
                let node = fiber.node().cloned().ok_or(LoomError::MissingInstance(id))?;
                let new = Rc::clone(&fiber.props);
                let old = previous
                    .map(|previous| Rc::clone(&previous.props))
                    .unwrap_or_else(|| Rc::new(Props::new()));
                host::update_properties(
                    &mut self.host,
                    &node,
                    &old,
                    &new,
                    &mut self.stats.mutations,
                )?;
            }
            WorkTag::Root | WorkTag::ClassComponent => {}
        }
        Ok(())
    }

    /// Remove the render-target nodes of `id` from `parent`.
    ///
    /// A component has no node of its own, so its rendered subtree is removed
    /// instead.
    fn commit_deletion(&mut self, id: FiberId, parent: &H::Node) -> LoomResult<()> {
        let fiber = self.fiber_ref(id)?;
        if fiber.tag.is_host_node() {
            let node = fiber.node().cloned().ok_or(LoomError::MissingInstance(id))?;
            self.host
                .remove_child(parent, &node)
                .map_err(LoomError::host)?;
            self.stats.mutations += 1;
            return Ok(());
        }

        let mut child = fiber.child;
        while let Some(id) = child {
            self.commit_deletion(id, parent)?;
            child = self.fiber_ref(id)?.sibling;
        }
        Ok(())
    }

    /// Node of the nearest ancestor children can be mounted into.
    fn host_parent_node(&self, id: FiberId) -> LoomResult<H::Node> {
        let mut cursor = self.fiber_ref(id)?.return_fiber;
        while let Some(ancestor) = cursor {
            let fiber = self.fiber_ref(ancestor)?;
            if fiber.tag.is_host_parent() {
                return fiber
                    .node()
                    .cloned()
                    .ok_or(LoomError::MissingInstance(ancestor));
            }
            cursor = fiber.return_fiber;
        }
        Err(LoomError::NoHostParent(id))
    }

    /// `id` itself, or its first host descendant through component wrappers.
    fn host_fiber_below(&self, id: FiberId) -> LoomResult<FiberId> {
        let mut cursor = id;
        loop {
            let fiber = self.fiber_ref(cursor)?;
            if fiber.tag.is_host_node() {
                return Ok(cursor);
            }
            match fiber.child {
                Some(child) => cursor = child,
                None => return Err(LoomError::MissingInstance(id)),
            }
        }
    }

    fn host_node_below(&self, id: FiberId) -> LoomResult<H::Node> {
        let host = self.host_fiber_below(id)?;
        self.fiber_ref(host)?
            .node()
            .cloned()
            .ok_or(LoomError::MissingInstance(host))
    }
}
