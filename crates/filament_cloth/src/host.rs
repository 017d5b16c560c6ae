//! In-memory render target.

use std::rc::Rc;

use filament_loom::{Event, Host, Value};
use filament_spool::{CompactString, SlotMap};

use crate::error::{ClothError, ClothResult};
use crate::mutation::{Mutation, Op};
use crate::node::{is_listener, HostNode, NodeId, NodeKind};

/// A tree of nodes living in memory, with a log of every mutation applied.
#[derive(Debug, Default)]
pub struct MemoryHost {
    /// All nodes, attached or not
    nodes: SlotMap<NodeId, HostNode>,
    /// Adapter calls in the order they were applied
    mutations: Vec<Mutation>,
    /// Adapter call that fails next
    fail_next: Option<Op>,
}

impl MemoryHost {
    /// Create an empty render target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node to mount into. Not recorded as a mutation.
    pub fn create_container(&mut self) -> NodeId {
        self.nodes.insert(HostNode::element("#container"))
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&HostNode> {
        self.nodes.get(id)
    }

    /// Child IDs of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Get the number of nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Serialize a node and its subtree.
    ///
    /// Attributes are written in key order; listeners are omitted.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        self.walk_preorder(id)
            .filter_map(|(_, node)| node.text_content())
            .collect()
    }

    /// Find the first element with `key` set to `value`, in document order.
    pub fn find_by_attr(&self, root: NodeId, key: &str, value: &str) -> Option<NodeId> {
        self.walk_preorder(root)
            .find(|(_, node)| node.attribute(key).and_then(Value::as_str) == Some(value))
            .map(|(id, _)| id)
    }

    /// Find every element with the given tag, in document order.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.walk_preorder(root)
            .filter(|(_, node)| node.tag() == Some(tag))
            .map(|(id, _)| id)
            .collect()
    }

    /// Invoke the listener registered under `event.name`.
    pub fn dispatch(&self, id: NodeId, event: Event) -> ClothResult<()> {
        let node = self.nodes.get(id).ok_or(ClothError::UnknownNode(id))?;
        let handler = node
            .listener(&event.name)
            .cloned()
            .ok_or_else(|| ClothError::NoListener {
                node: id,
                event: event.name.to_string(),
            })?;
        tracing::trace!(node = ?id, event = %event.name, "dispatch");
        handler(&event);
        Ok(())
    }

    /// Dispatch `onClick`.
    pub fn click(&self, id: NodeId) -> ClothResult<()> {
        self.dispatch(id, Event::new("onClick"))
    }

    /// Applied mutations, oldest first.
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Drain the mutation log.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Make the next `op` call fail with [`ClothError::Injected`].
    pub fn fail_next(&mut self, op: Op) {
        self.fail_next = Some(op);
    }

    /// Walk a subtree depth-first, pre-order.
    pub fn walk_preorder(&self, start: NodeId) -> TreeWalker<'_> {
        TreeWalker::new(self, start)
    }

    fn check(&mut self, op: Op) -> ClothResult<()> {
        if self.fail_next == Some(op) {
            self.fail_next = None;
            return Err(ClothError::Injected(op));
        }
        Ok(())
    }

    fn node_mut(&mut self, id: NodeId) -> ClothResult<&mut HostNode> {
        self.nodes.get_mut(id).ok_or(ClothError::UnknownNode(id))
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => escape_into(text, out),
            NodeKind::Element {
                tag, attributes, ..
            } => {
                out.push('<');
                out.push_str(tag);
                let mut attrs: Vec<_> = attributes.iter().collect();
                attrs.sort_by(|a, b| a.0.cmp(b.0));
                for (key, value) in attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    escape_into(&value.to_text(), out);
                    out.push('"');
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

impl Host for MemoryHost {
    type Node = NodeId;
    type Error = ClothError;

    fn create_element(&mut self, tag: &str) -> ClothResult<NodeId> {
        self.check(Op::CreateElement)?;
        let node = self.nodes.insert(HostNode::element(tag));
        self.mutations.push(Mutation::CreateElement {
            node,
            tag: tag.into(),
        });
        Ok(node)
    }

    fn create_text(&mut self, text: &str) -> ClothResult<NodeId> {
        self.check(Op::CreateText)?;
        let node = self.nodes.insert(HostNode::text(text));
        self.mutations.push(Mutation::CreateText {
            node,
            text: text.into(),
        });
        Ok(node)
    }

    fn set_property(&mut self, node: &NodeId, key: &str, value: &Value) -> ClothResult<()> {
        self.check(Op::SetProperty)?;
        let id = *node;
        let NodeKind::Element {
            attributes,
            listeners,
            ..
        } = &mut self.node_mut(id)?.kind
        else {
            return Err(ClothError::NotAnElement(id));
        };
        match value.as_handler() {
            Some(handler) if is_listener(key, value) => {
                attributes.remove(key);
                listeners.insert(key.into(), Rc::clone(handler));
            }
            _ => {
                listeners.remove(key);
                attributes.insert(key.into(), value.clone());
            }
        }
        self.mutations.push(Mutation::SetProperty {
            node: id,
            key: key.into(),
        });
        Ok(())
    }

    fn remove_property(&mut self, node: &NodeId, key: &str) -> ClothResult<()> {
        self.check(Op::RemoveProperty)?;
        let id = *node;
        let NodeKind::Element {
            attributes,
            listeners,
            ..
        } = &mut self.node_mut(id)?.kind
        else {
            return Err(ClothError::NotAnElement(id));
        };
        attributes.remove(key);
        listeners.remove(key);
        self.mutations.push(Mutation::RemoveProperty {
            node: id,
            key: key.into(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> ClothResult<()> {
        self.check(Op::AppendChild)?;
        let (parent, child) = (*parent, *child);
        if parent == child {
            return Err(ClothError::SelfAppend(child));
        }
        if !self.node_mut(parent)?.is_element() {
            return Err(ClothError::NotAnElement(parent));
        }

        // Appending an attached node moves it.
        if let Some(previous) = self.node_mut(child)?.parent.take() {
            if let Some(node) = self.nodes.get_mut(previous) {
                node.remove_child(child);
            }
        }
        self.node_mut(parent)?.add_child(child);
        self.node_mut(child)?.parent = Some(parent);
        self.mutations.push(Mutation::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> ClothResult<()> {
        self.check(Op::RemoveChild)?;
        let (parent, child) = (*parent, *child);
        if self.node_mut(child)?.parent != Some(parent) || !self.node_mut(parent)?.remove_child(child)
        {
            return Err(ClothError::NotAChild { parent, child });
        }
        self.node_mut(child)?.parent = None;
        self.mutations.push(Mutation::RemoveChild { parent, child });
        Ok(())
    }

    fn set_text(&mut self, node: &NodeId, text: &str) -> ClothResult<()> {
        self.check(Op::SetText)?;
        let id = *node;
        let NodeKind::Text(content) = &mut self.node_mut(id)?.kind else {
            return Err(ClothError::NotAText(id));
        };
        *content = text.into();
        self.mutations.push(Mutation::SetText {
            node: id,
            text: CompactString::from(text),
        });
        Ok(())
    }
}

/// Iterator for depth-first, pre-order traversal.
pub struct TreeWalker<'a> {
    host: &'a MemoryHost,
    stack: Vec<NodeId>,
}

impl<'a> TreeWalker<'a> {
    fn new(host: &'a MemoryHost, start: NodeId) -> Self {
        Self {
            host,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for TreeWalker<'a> {
    type Item = (NodeId, &'a HostNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.host.get(id) {
                // Push children in reverse order so they're visited left to right
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((id, node));
            }
        }
        None
    }
}
