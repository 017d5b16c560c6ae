//! Render-target node definitions.

use filament_loom::{EventHandler, Value};
use filament_spool::{new_key_type, CompactString, FxHashMap, SmallVec};

new_key_type! {
    /// Handle to a node in a [`MemoryHost`](crate::MemoryHost).
    pub struct NodeId;
}

/// Node type and content.
#[derive(Clone)]
pub enum NodeKind {
    /// An element with attributes and listeners
    Element {
        /// Tag name
        tag: CompactString,
        /// Plain attributes
        attributes: FxHashMap<CompactString, Value>,
        /// Event listeners by attribute key (e.g. `onClick`)
        listeners: FxHashMap<CompactString, EventHandler>,
    },
    /// A text node
    Text(CompactString),
}

impl std::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Element {
                tag,
                attributes,
                listeners,
            } => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("attributes", attributes)
                .field("listeners", &listeners.keys().collect::<Vec<_>>())
                .finish(),
            NodeKind::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

/// A node in the render target.
#[derive(Debug, Clone)]
pub struct HostNode {
    /// Node type and content
    pub kind: NodeKind,
    /// Parent node, if attached
    pub parent: Option<NodeId>,
    /// Child node IDs
    pub children: SmallVec<[NodeId; 4]>,
}

impl HostNode {
    /// Create an element node.
    pub fn element(tag: impl Into<CompactString>) -> Self {
        Self::new(NodeKind::Element {
            tag: tag.into(),
            attributes: FxHashMap::default(),
            listeners: FxHashMap::default(),
        })
    }

    /// Create a text node.
    pub fn text(content: impl Into<CompactString>) -> Self {
        Self::new(NodeKind::Text(content.into()))
    }

    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: SmallVec::new(),
        }
    }

    /// Tag name of an element.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// Attribute of an element.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        match &self.kind {
            NodeKind::Element { attributes, .. } => attributes.get(key),
            NodeKind::Text(_) => None,
        }
    }

    /// Listener of an element.
    pub fn listener(&self, key: &str) -> Option<&EventHandler> {
        match &self.kind {
            NodeKind::Element { listeners, .. } => listeners.get(key),
            NodeKind::Text(_) => None,
        }
    }

    /// Content of a text node.
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element { .. } => None,
        }
    }

    /// Check if this is an element.
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    /// Add a child node.
    pub fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Remove a child node. Returns whether it was present.
    pub fn remove_child(&mut self, child: NodeId) -> bool {
        match self.children.iter().position(|&id| id == child) {
            Some(index) => {
                self.children.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Whether a property is stored as an event listener.
pub(crate) fn is_listener(key: &str, value: &Value) -> bool {
    key.starts_with("on") && value.is_handler()
}
