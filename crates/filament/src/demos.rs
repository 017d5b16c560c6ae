//! Demo components.

use filament_loom::{Component, Element, Props, RenderContext, State, StateHandle, Value};

/// Click counter.
///
/// Renders `<div id="counter"><span>{count}</span><button>+1</button></div>`;
/// the button's `onClick` listener increments `count`.
pub struct Counter {
    start: i64,
}

impl Counter {
    /// Describe a counter starting at `start`.
    pub fn element(start: i64) -> Element {
        Element::component::<Counter>(Props::new().with("start", start))
    }
}

impl Component for Counter {
    fn create(props: &Props) -> Self {
        Self {
            start: props.get("start").and_then(Value::as_int).unwrap_or(0),
        }
    }

    fn initial_state(&self) -> State {
        State::new().with("count", self.start)
    }

    fn render(&self, cx: &RenderContext<'_>) -> Option<Element> {
        let count = cx.state().int("count").unwrap_or_default();
        let handle = cx.handle();
        Some(
            Element::host("div")
                .attr("id", "counter")
                .child(Element::host("span").child(count))
                .child(
                    Element::host("button")
                        .on("onClick", move |_| increment(&handle))
                        .child("+1"),
                ),
        )
    }
}

fn increment(handle: &StateHandle) {
    handle.update(|state| State::new().with("count", state.int("count").unwrap_or_default() + 1));
}

/// List of `len` items.
///
/// Renders `<ul><li>item 0</li>...</ul>`; setting `len` in its state grows or
/// shrinks the list.
pub struct ListDemo {
    len: i64,
}

impl ListDemo {
    /// Describe a list of `len` items.
    pub fn element(len: i64) -> Element {
        Element::component::<ListDemo>(Props::new().with("len", len))
    }
}

impl Component for ListDemo {
    fn create(props: &Props) -> Self {
        Self {
            len: props.get("len").and_then(Value::as_int).unwrap_or(0),
        }
    }

    fn initial_state(&self) -> State {
        State::new().with("len", self.len)
    }

    fn render(&self, cx: &RenderContext<'_>) -> Option<Element> {
        let len = cx.state().int("len").unwrap_or_default().max(0);
        Some(
            Element::host("ul")
                .attr("class", "items")
                .children((0..len).map(|i| Element::host("li").child(format!("item {i}")))),
        )
    }
}
