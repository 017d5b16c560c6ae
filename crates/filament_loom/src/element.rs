//! Element descriptions.
//!
//! An [`Element`] is the immutable description of one tree node: what kind of
//! node it is, its attributes, and its ordered children. Descriptions are built
//! fresh for every render and are never mutated by the reconciler; fibers only
//! hold shared references to their props.

use std::fmt;
use std::rc::Rc;

use filament_spool::{CompactString, FxHashMap};

use crate::component::{Component, ComponentType};

/// Attribute key under which text leaves carry their content.
pub const TEXT_KEY: &str = "text";

/// An event delivered to a listener attribute.
#[derive(Debug, Clone)]
pub struct Event {
    /// Listener key the event was dispatched to (e.g. `onClick`)
    pub name: CompactString,
    /// Event payload
    pub value: Value,
}

impl Event {
    /// Create an event without payload.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            value: Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }
}

/// Listener callback stored in an attribute.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// An attribute or state value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent / null value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(CompactString),
    /// Event listener
    Handler(EventHandler),
}

impl Value {
    /// Wrap a closure as a listener value.
    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        Value::Handler(Rc::new(f))
    }

    /// Get the integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the listener, if this is one.
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Check whether this is a listener.
    pub fn is_handler(&self) -> bool {
        matches!(self, Value::Handler(_))
    }

    /// Render the value as text content.
    ///
    /// Null and listeners render as the empty string.
    pub fn to_text(&self) -> CompactString {
        match self {
            Value::Null | Value::Handler(_) => CompactString::default(),
            Value::Bool(b) => CompactString::from(if *b { "true" } else { "false" }),
            Value::Int(n) => CompactString::from(n.to_string()),
            Value::Float(f) => CompactString::from(f.to_string()),
            Value::Str(s) => s.clone(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Handler(a), Value::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<CompactString> for Value {
    fn from(value: CompactString) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Configuration of an element: attributes plus ordered children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    attributes: FxHashMap<CompactString, Value>,
    children: Vec<Element>,
}

impl Props {
    /// Create empty props.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute.
    pub fn with(mut self, key: impl Into<CompactString>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set an attribute in place.
    pub fn insert(&mut self, key: impl Into<CompactString>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Append a child description.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Get an attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Iterate attributes in key order.
    pub fn sorted_attributes(&self) -> Vec<(&CompactString, &Value)> {
        let mut attrs: Vec<_> = self.attributes.iter().collect();
        attrs.sort_by(|a, b| a.0.cmp(b.0));
        attrs
    }

    /// Child descriptions in order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Text content of a text leaf.
    pub fn text(&self) -> Option<CompactString> {
        self.get(TEXT_KEY).map(Value::to_text)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// What kind of node an element describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    /// The root sentinel bound to the container
    Root,
    /// A text leaf
    Text,
    /// A render-target element by tag name
    Host(CompactString),
    /// A stateful component
    Component(ComponentType),
}

impl ElementType {
    /// Human readable name, used in logs and errors.
    pub fn name(&self) -> &str {
        match self {
            ElementType::Root => "#root",
            ElementType::Text => "#text",
            ElementType::Host(tag) => tag.as_str(),
            ElementType::Component(ty) => ty.name(),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(tag.into())
    }
}

impl From<CompactString> for ElementType {
    fn from(tag: CompactString) -> Self {
        ElementType::Host(tag)
    }
}

impl From<ComponentType> for ElementType {
    fn from(ty: ComponentType) -> Self {
        ElementType::Component(ty)
    }
}

/// Immutable description of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    /// Create an element from a type and props.
    pub fn new(ty: impl Into<ElementType>, props: Props) -> Self {
        Self {
            ty: ty.into(),
            props: Rc::new(props),
        }
    }

    /// Create a host element.
    pub fn host(tag: impl Into<CompactString>) -> Self {
        Self::new(ElementType::Host(tag.into()), Props::new())
    }

    /// Create a text leaf.
    pub fn text(value: impl Into<Value>) -> Self {
        Self::new(ElementType::Text, Props::new().with(TEXT_KEY, value))
    }

    /// Create a component element.
    pub fn component<C: Component>(props: Props) -> Self {
        Self::new(ComponentType::of::<C>(), props)
    }

    /// Create the root description wrapping the top-level children.
    pub fn root(children: impl IntoIterator<Item = Element>) -> Self {
        let mut props = Props::new();
        for child in children {
            props.push_child(child);
        }
        Self::new(ElementType::Root, props)
    }

    /// Set an attribute.
    pub fn attr(mut self, key: impl Into<CompactString>, value: impl Into<Value>) -> Self {
        Rc::make_mut(&mut self.props).insert(key, value);
        self
    }

    /// Set a listener attribute (e.g. `onClick`).
    pub fn on(self, key: impl Into<CompactString>, f: impl Fn(&Event) + 'static) -> Self {
        self.attr(key, Value::handler(f))
    }

    /// Append a child, wrapping plain values as text leaves.
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        Rc::make_mut(&mut self.props).push_child(child.into().into_element());
        self
    }

    /// Append several children.
    pub fn children<C: Into<Child>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        let props = Rc::make_mut(&mut self.props);
        for child in children {
            props.push_child(child.into().into_element());
        }
        self
    }

    /// Element type.
    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    /// Element props.
    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }
}

/// A child passed to the element factory.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    /// Already an element description
    Element(Element),
    /// A plain value that becomes a text leaf
    Text(Value),
}

impl Child {
    /// Turn the child into an element, wrapping plain values as text leaves.
    pub fn into_element(self) -> Element {
        match self {
            Child::Element(element) => element,
            Child::Text(value) => Element::text(value),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<Value> for Child {
    fn from(value: Value) -> Self {
        Child::Text(value)
    }
}

macro_rules! child_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(Value::from(value))
                }
            }
        )*
    };
}

child_from_value!(&str, String, CompactString, i64, i32, u32, f64, bool);

/// Build an element from a type, attributes and children.
///
/// Children that are not already elements are wrapped as text leaves.
///
/// ```
/// use filament_loom::{create_element, Child};
///
/// let div = create_element("div", [("id", "counter")], [Child::from("0")]);
/// assert_eq!(div.props().children().len(), 1);
/// assert_eq!(div.props().children()[0].props().text().as_deref(), Some("0"));
/// ```
pub fn create_element<K, V, C>(
    ty: impl Into<ElementType>,
    attributes: impl IntoIterator<Item = (K, V)>,
    children: impl IntoIterator<Item = C>,
) -> Element
where
    K: Into<CompactString>,
    V: Into<Value>,
    C: Into<Child>,
{
    let mut props = Props::new();
    for (key, value) in attributes {
        props.insert(key, value);
    }
    for child in children {
        props.push_child(child.into().into_element());
    }
    Element::new(ty, props)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_children_are_wrapped() {
        let el = Element::host("span").child("hello").child(42);
        let children = el.props().children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].ty(), &ElementType::Text);
        assert_eq!(children[0].props().text().as_deref(), Some("hello"));
        assert_eq!(children[1].props().text().as_deref(), Some("42"));
    }

    #[test]
    fn test_handler_equality_is_identity() {
        let a = Value::handler(|_| {});
        let b = Value::handler(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_sorted_attributes() {
        let props = Props::new().with("z", 1).with("a", 2).with("m", 3);
        let keys: Vec<_> = props
            .sorted_attributes()
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_create_element_mixed_children() {
        let el = create_element(
            "ul",
            [("class", "items")],
            [Child::from(Element::host("li")), Child::from("tail")],
        );
        assert_eq!(el.ty().name(), "ul");
        assert_eq!(el.props().get("class"), Some(&Value::from("items")));
        assert_eq!(el.props().children()[1].ty(), &ElementType::Text);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(Value::from(7).to_text(), "7");
        assert_eq!(Value::from(true).to_text(), "true");
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::handler(|_| {}).to_text(), "");
    }
}
