//! Fiber definitions.
//!
//! Fibers live in a slot map and refer to each other by [`FiberId`]. The tree
//! is threaded through `child` (first child), `sibling` (next at the same
//! depth) and `return_fiber` (parent). `alternate` pairs a fiber with its
//! counterpart in the other generation; the two always point at each other.

use std::rc::Rc;

use filament_spool::new_key_type;

use crate::element::{ElementType, Props};
use crate::error::{LoomError, LoomResult};
use crate::update_queue::{shared_queue, SharedQueue};

new_key_type! {
    /// Handle to a fiber in the arena.
    pub struct FiberId;

    /// Handle to a live component instance.
    pub struct ComponentId;
}

/// How a fiber is processed when visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTag {
    /// The container root
    Root,
    /// A render-target element
    HostElement,
    /// A render-target text node
    TextElement,
    /// A stateful component wrapper
    ClassComponent,
}

impl WorkTag {
    /// Derive the tag for a child description.
    ///
    /// The root sentinel is never a valid child.
    pub fn for_child(ty: &ElementType) -> LoomResult<Self> {
        match ty {
            ElementType::Text => Ok(WorkTag::TextElement),
            ElementType::Host(_) => Ok(WorkTag::HostElement),
            ElementType::Component(_) => Ok(WorkTag::ClassComponent),
            ElementType::Root => Err(LoomError::malformed(
                "the root element cannot appear as a child",
            )),
        }
    }

    /// Whether the fiber's instance is itself a render-target node that can
    /// be appended or removed.
    pub fn is_host_node(self) -> bool {
        matches!(self, WorkTag::HostElement | WorkTag::TextElement)
    }

    /// Whether children can be mounted into this fiber's instance.
    pub fn is_host_parent(self) -> bool {
        matches!(self, WorkTag::Root | WorkTag::HostElement)
    }
}

/// Pending render-target mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EffectTag {
    /// Nothing to do
    #[default]
    None,
    /// Append the node under its host parent
    Placement,
    /// Patch the existing node
    Update,
    /// Remove the node from its host parent
    Deletion,
}

/// What a fiber owns.
#[derive(Debug, Clone, PartialEq)]
pub enum Instance<N> {
    /// A render-target node (root, element or text)
    Node(N),
    /// A component instance
    Component(ComponentId),
}

/// One unit of work.
#[derive(Debug)]
pub struct Fiber<N> {
    /// How the fiber is processed
    pub tag: WorkTag,
    /// Element type this fiber was built from
    pub ty: ElementType,
    /// Props of this generation
    pub props: Rc<Props>,
    /// Render-target node or component, created lazily
    pub instance: Option<Instance<N>>,
    /// Parent fiber
    pub return_fiber: Option<FiberId>,
    /// First child
    pub child: Option<FiberId>,
    /// Next fiber at the same depth
    pub sibling: Option<FiberId>,
    /// Counterpart in the other generation
    pub alternate: Option<FiberId>,
    /// Pending mutation
    pub effect_tag: EffectTag,
    /// Head of this subtree's effect list
    pub first_effect: Option<FiberId>,
    /// Tail of this subtree's effect list
    pub last_effect: Option<FiberId>,
    /// Next fiber in the enclosing effect list
    pub next_effect: Option<FiberId>,
    /// Pending state updates
    pub update_queue: Option<SharedQueue>,
}

impl<N> Fiber<N> {
    /// Create a detached fiber.
    pub fn new(tag: WorkTag, ty: ElementType, props: Rc<Props>) -> Self {
        Self {
            tag,
            ty,
            props,
            instance: None,
            return_fiber: None,
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: EffectTag::None,
            first_effect: None,
            last_effect: None,
            next_effect: None,
            update_queue: None,
        }
    }

    /// Create a root fiber bound to the container node.
    pub fn root(props: Rc<Props>, container: N) -> Self {
        let mut fiber = Self::new(WorkTag::Root, ElementType::Root, props);
        fiber.instance = Some(Instance::Node(container));
        fiber.update_queue = Some(shared_queue());
        fiber
    }

    /// The render-target node, if this fiber owns one.
    pub fn node(&self) -> Option<&N> {
        match &self.instance {
            Some(Instance::Node(node)) => Some(node),
            _ => None,
        }
    }

    /// The component instance, if this fiber owns one.
    pub fn component(&self) -> Option<ComponentId> {
        match &self.instance {
            Some(Instance::Component(id)) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn reset_effects(&mut self) {
        self.first_effect = None;
        self.last_effect = None;
        self.next_effect = None;
    }

    /// Drop every tree and effect link, keeping identity, instance and queue.
    pub(crate) fn detach(&mut self) {
        self.return_fiber = None;
        self.child = None;
        self.sibling = None;
        self.effect_tag = EffectTag::None;
        self.reset_effects();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_for_child() {
        assert_eq!(
            WorkTag::for_child(&ElementType::Text).ok(),
            Some(WorkTag::TextElement)
        );
        assert_eq!(
            WorkTag::for_child(&ElementType::from("div")).ok(),
            Some(WorkTag::HostElement)
        );
        assert!(matches!(
            WorkTag::for_child(&ElementType::Root),
            Err(LoomError::MalformedElement(_))
        ));
    }

    #[test]
    fn test_host_capability() {
        assert!(WorkTag::TextElement.is_host_node());
        assert!(!WorkTag::TextElement.is_host_parent());
        assert!(WorkTag::Root.is_host_parent());
        assert!(!WorkTag::Root.is_host_node());
        assert!(!WorkTag::ClassComponent.is_host_node());
    }

    #[test]
    fn test_root_fiber_owns_container() {
        let fiber: Fiber<u32> = Fiber::root(Rc::new(Props::new()), 7);
        assert_eq!(fiber.node(), Some(&7));
        assert_eq!(fiber.component(), None);
        assert!(fiber.update_queue.is_some());
    }
}
