//! Render-target adapter.
//!
//! The commit engine mutates the render target exclusively through [`Host`].
//! Nodes are opaque handles; the adapter owns whatever they refer to.

use std::fmt::Debug;

use filament_spool::CompactString;

use crate::element::{ElementType, Props, Value, TEXT_KEY};
use crate::error::{LoomError, LoomResult};

/// Primitive mutations of a render target.
pub trait Host {
    /// Handle to a node owned by the target.
    type Node: Clone + PartialEq + Debug;
    /// Error raised when a mutation is rejected.
    type Error: std::error::Error + 'static;

    /// Create a detached element node.
    fn create_element(&mut self, tag: &str) -> Result<Self::Node, Self::Error>;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> Result<Self::Node, Self::Error>;

    /// Set an attribute or listener on an element node.
    fn set_property(&mut self, node: &Self::Node, key: &str, value: &Value)
        -> Result<(), Self::Error>;

    /// Remove an attribute or listener from an element node.
    fn remove_property(&mut self, node: &Self::Node, key: &str) -> Result<(), Self::Error>;

    /// Append `child` as the last child of `parent`.
    ///
    /// A child that is already attached elsewhere is moved.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node)
        -> Result<(), Self::Error>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node)
        -> Result<(), Self::Error>;

    /// Replace the content of a text node.
    fn set_text(&mut self, node: &Self::Node, text: &str) -> Result<(), Self::Error>;
}

/// Create the render-target node for a host or text fiber.
pub(crate) fn create_instance<H: Host>(
    host: &mut H,
    ty: &ElementType,
    props: &Props,
) -> LoomResult<H::Node> {
    match ty {
        ElementType::Text => {
            let text = text_of(props)?;
            host.create_text(&text).map_err(LoomError::host)
        }
        ElementType::Host(tag) => {
            let node = host.create_element(tag).map_err(LoomError::host)?;
            update_properties(host, &node, &Props::new(), props, &mut 0)?;
            Ok(node)
        }
        other => Err(LoomError::malformed(format!(
            "`{}` has no render-target node",
            other.name()
        ))),
    }
}

/// Apply the attribute difference between `old` and `new` to `node`.
///
/// Keys present only in `old` are removed, keys whose value changed are set.
/// Children are never touched here. `touched` counts the calls that were
/// applied, including those before a failing one.
pub(crate) fn update_properties<H: Host>(
    host: &mut H,
    node: &H::Node,
    old: &Props,
    new: &Props,
    touched: &mut usize,
) -> LoomResult<()> {
    for (key, _) in old.sorted_attributes() {
        if new.get(key).is_none() {
            host.remove_property(node, key).map_err(LoomError::host)?;
            *touched += 1;
        }
    }

    for (key, value) in new.sorted_attributes() {
        if old.get(key) != Some(value) {
            host.set_property(node, key, value).map_err(LoomError::host)?;
            *touched += 1;
        }
    }

    Ok(())
}

/// Text that a text fiber should display.
pub(crate) fn text_of(props: &Props) -> LoomResult<CompactString> {
    props
        .text()
        .ok_or_else(|| LoomError::malformed(format!("text leaf without a `{TEXT_KEY}` attribute")))
}

#[cfg(test)]
pub(crate) mod testing {
    //! A recording host for unit tests inside this crate.

    use std::fmt;

    use super::*;

    #[derive(Debug)]
    pub struct TestError(pub &'static str);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} failed", self.0)
        }
    }

    impl std::error::Error for TestError {}

    /// Nodes are numbered in creation order; node 0 is the container.
    #[derive(Debug, Default)]
    pub struct RecordingHost {
        pub next: u32,
        pub log: Vec<String>,
        pub fail_on: Option<&'static str>,
    }

    impl RecordingHost {
        pub fn new() -> Self {
            Self {
                next: 1,
                ..Self::default()
            }
        }

        fn record(&mut self, op: &'static str, entry: String) -> Result<(), TestError> {
            if self.fail_on == Some(op) {
                self.fail_on = None;
                return Err(TestError(op));
            }
            self.log.push(entry);
            Ok(())
        }

        fn alloc(&mut self) -> u32 {
            let id = self.next;
            self.next += 1;
            id
        }

        pub fn take_log(&mut self) -> Vec<String> {
            std::mem::take(&mut self.log)
        }
    }

    impl Host for RecordingHost {
        type Node = u32;
        type Error = TestError;

        fn create_element(&mut self, tag: &str) -> Result<u32, TestError> {
            let id = self.next;
            self.record("create_element", format!("create {tag} #{id}"))?;
            Ok(self.alloc())
        }

        fn create_text(&mut self, text: &str) -> Result<u32, TestError> {
            let id = self.next;
            self.record("create_text", format!("text {text:?} #{id}"))?;
            Ok(self.alloc())
        }

        fn set_property(&mut self, node: &u32, key: &str, value: &Value) -> Result<(), TestError> {
            self.record("set_property", format!("set #{node} {key}={value:?}"))
        }

        fn remove_property(&mut self, node: &u32, key: &str) -> Result<(), TestError> {
            self.record("remove_property", format!("unset #{node} {key}"))
        }

        fn append_child(&mut self, parent: &u32, child: &u32) -> Result<(), TestError> {
            self.record("append_child", format!("append #{child} -> #{parent}"))
        }

        fn remove_child(&mut self, parent: &u32, child: &u32) -> Result<(), TestError> {
            self.record("remove_child", format!("remove #{child} <- #{parent}"))
        }

        fn set_text(&mut self, node: &u32, text: &str) -> Result<(), TestError> {
            self.record("set_text", format!("set_text #{node} {text:?}"))
        }
    }
}
