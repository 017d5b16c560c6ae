//! End-to-end render tests against the in-memory target.

use filament_cloth::{mount, MemoryHost, Mutation, NodeId, Op};
use filament_loom::{
    Component, EffectTag, Element, IdleLoop, LoomError, Props, RenderContext, Scheduler,
    SchedulerOptions, State, UnitBudget, WorkTag,
};

struct Counter;

impl Component for Counter {
    fn create(_props: &Props) -> Self {
        Counter
    }

    fn initial_state(&self) -> State {
        State::new().with("count", 0)
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
                        .on("onClick", move |_| {
                            handle.update(|state| {
                                State::new()
                                    .with("count", state.int("count").unwrap_or_default() + 1)
                            })
                        })
                        .child("+1"),
                ),
        )
    }
}

fn html(scheduler: &Scheduler<MemoryHost>) -> String {
    scheduler.host().inner_html(*scheduler.container())
}

fn rerender(scheduler: &mut Scheduler<MemoryHost>, element: Element) -> Vec<Op> {
    scheduler.host_mut().take_mutations();
    scheduler.render(element).unwrap();
    scheduler.flush().unwrap();
    ops(scheduler.host_mut().take_mutations())
}

fn ops(mutations: Vec<Mutation>) -> Vec<Op> {
    mutations.iter().map(Mutation::op).collect()
}

fn list(items: impl IntoIterator<Item = i64>) -> Element {
    Element::host("ul").children(items.into_iter().map(|n| Element::host("li").child(n)))
}

fn button(scheduler: &Scheduler<MemoryHost>) -> NodeId {
    scheduler.host().find_by_tag(*scheduler.container(), "button")[0]
}

// =============================================================================
// Mounting
// =============================================================================

mod mounting {
    use super::*;

    #[test]
    fn div_with_text() {
        let mut scheduler = mount(Element::host("div").child("0")).unwrap();
        insta::assert_snapshot!(html(&scheduler), @"<div>0</div>");

        let mutations = scheduler.host_mut().take_mutations();
        assert_eq!(
            ops(mutations),
            vec![Op::CreateElement, Op::CreateText, Op::AppendChild, Op::AppendChild]
        );
        let stats = scheduler.last_pass().unwrap();
        assert_eq!(stats.labels(EffectTag::Placement), vec!["#text", "div"]);
    }

    #[test]
    fn nested_attributes_are_sorted() {
        let scheduler = mount(
            Element::host("section")
                .attr("title", "t")
                .attr("class", "box")
                .child(Element::host("p").attr("lang", "en").child("hello"))
                .child(Element::host("p").child(1.5)),
        )
        .unwrap();
        insta::assert_snapshot!(
            html(&scheduler),
            @r#"<section class="box" title="t"><p lang="en">hello</p><p>1.5</p></section>"#
        );
    }

    #[test]
    fn component_renders_its_child() {
        let mut scheduler = mount(Element::component::<Counter>(Props::new())).unwrap();
        insta::assert_snapshot!(
            html(&scheduler),
            @r#"<div id="counter"><span>0</span><button>+1</button></div>"#
        );
        assert_eq!(scheduler.component_count(), 1);

        let container = *scheduler.container();
        let div = scheduler.host().find_by_tag(container, "div")[0];
        let appends_to_container = scheduler
            .host_mut()
            .take_mutations()
            .iter()
            .filter(|mutation| {
                matches!(mutation, Mutation::AppendChild { parent, child } if *parent == container && *child == div)
            })
            .count();
        assert_eq!(appends_to_container, 1);
    }
}

// =============================================================================
// Re-rendering
// =============================================================================

mod rerendering {
    use super::*;

    #[test]
    fn changed_text_is_a_single_update() {
        let mut scheduler = mount(Element::host("div").child("0")).unwrap();
        let div = scheduler.host().find_by_tag(*scheduler.container(), "div")[0];

        let ops = rerender(&mut scheduler, Element::host("div").child("1"));
        assert_eq!(ops, vec![Op::SetText]);
        insta::assert_snapshot!(html(&scheduler), @"<div>1</div>");
        assert_eq!(
            scheduler.host().find_by_tag(*scheduler.container(), "div"),
            vec![div]
        );
    }

    #[test]
    fn unchanged_tree_touches_nothing() {
        let tree = || list([1, 2, 3]);
        let mut scheduler = mount(tree()).unwrap();
        let ops = rerender(&mut scheduler, tree());
        assert!(ops.is_empty());

        let stats = scheduler.last_pass().unwrap();
        assert_eq!(stats.count(EffectTag::Placement), 0);
        assert_eq!(stats.count(EffectTag::Deletion), 0);
    }

    #[test]
    fn attributes_are_diffed() {
        let mut scheduler = mount(
            Element::host("input")
                .attr("class", "a")
                .attr("placeholder", "name"),
        )
        .unwrap();

        scheduler.host_mut().take_mutations();
        scheduler
            .render(Element::host("input").attr("class", "b").attr("value", 3))
            .unwrap();
        scheduler.flush().unwrap();

        let mutations = scheduler.host_mut().take_mutations();
        let keys: Vec<_> = mutations
            .iter()
            .map(|mutation| match mutation {
                Mutation::SetProperty { key, .. } => format!("set {key}"),
                Mutation::RemoveProperty { key, .. } => format!("remove {key}"),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(keys, vec!["remove placeholder", "set class", "set value"]);
        insta::assert_snapshot!(html(&scheduler), @r#"<input class="b" value="3"></input>"#);
    }

    #[test]
    fn shrinking_list_removes_the_tail() {
        let mut scheduler = mount(list(0..5)).unwrap();
        let ops = rerender(&mut scheduler, list(0..2));

        assert_eq!(ops, vec![Op::RemoveChild, Op::RemoveChild, Op::RemoveChild]);
        insta::assert_snapshot!(html(&scheduler), @"<ul><li>0</li><li>1</li></ul>");
        assert_eq!(scheduler.last_pass().unwrap().count(EffectTag::Deletion), 3);
    }

    #[test]
    fn growing_list_appends() {
        let mut scheduler = mount(list(0..1)).unwrap();
        let ops = rerender(&mut scheduler, list(0..3));

        let appends = ops.iter().filter(|op| **op == Op::AppendChild).count();
        assert_eq!(appends, 4);
        insta::assert_snapshot!(html(&scheduler), @"<ul><li>0</li><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn type_change_replaces_the_node() {
        let mut scheduler = mount(
            Element::host("div")
                .child(Element::host("span"))
                .child(Element::host("em")),
        )
        .unwrap();
        let em = scheduler.host().find_by_tag(*scheduler.container(), "em")[0];

        let ops = rerender(
            &mut scheduler,
            Element::host("div")
                .child(Element::host("p"))
                .child(Element::host("em")),
        );

        assert_eq!(
            ops,
            vec![
                Op::CreateElement,
                Op::RemoveChild,
                Op::AppendChild,
                Op::AppendChild,
            ]
        );
        insta::assert_snapshot!(html(&scheduler), @"<div><p></p><em></em></div>");
        assert_eq!(
            scheduler.host().find_by_tag(*scheduler.container(), "em"),
            vec![em]
        );
    }

    #[test]
    fn replacing_inside_a_list_keeps_order() {
        let items = |middle: &str| {
            Element::host("ul")
                .child(Element::host("li").child("a"))
                .child(Element::host(middle).child("b"))
                .child(Element::host("li").child("c"))
        };
        let mut scheduler = mount(items("li")).unwrap();

        rerender(&mut scheduler, items("hr"));
        insta::assert_snapshot!(html(&scheduler), @"<ul><li>a</li><hr>b</hr><li>c</li></ul>");

        rerender(&mut scheduler, items("li"));
        insta::assert_snapshot!(html(&scheduler), @"<ul><li>a</li><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn removing_a_component_removes_its_output() {
        let mut scheduler = mount(
            Element::host("main")
                .child(Element::component::<Counter>(Props::new()))
                .child("tail"),
        )
        .unwrap();

        rerender(&mut scheduler, Element::host("main"));
        insta::assert_snapshot!(html(&scheduler), @"<main></main>");
        assert_eq!(scheduler.component_count(), 0);
    }
}

// =============================================================================
// State updates
// =============================================================================

mod state {
    use super::*;

    #[test]
    fn clicks_fold_into_one_pass() {
        let mut scheduler = mount(Element::component::<Counter>(Props::new())).unwrap();
        scheduler.host_mut().take_mutations();

        let button = button(&scheduler);
        for _ in 0..3 {
            scheduler.host().click(button).unwrap();
        }
        assert!(scheduler.has_pending_work());

        let slices = scheduler.flush().unwrap();
        assert_eq!(slices, 1);
        insta::assert_snapshot!(
            html(&scheduler),
            @r#"<div id="counter"><span>3</span><button>+1</button></div>"#
        );

        // Listeners are fresh closures on every render, so they are reset too.
        let ops = ops(scheduler.host_mut().take_mutations());
        assert_eq!(ops, vec![Op::SetText, Op::SetProperty]);

        let states = scheduler.component_states();
        assert_eq!(states[0].0, "Counter");
        assert_eq!(states[0].1.int("count"), Some(3));
    }

    #[test]
    fn instance_survives_updates() {
        let mut scheduler = mount(Element::component::<Counter>(Props::new())).unwrap();
        let component = scheduler
            .current_fibers()
            .into_iter()
            .find(|id| scheduler.fiber(*id).map(|fiber| fiber.tag) == Some(WorkTag::ClassComponent))
            .unwrap();
        let instance = scheduler.fiber(component).unwrap().component();

        for clicks in 1..=4 {
            let button = button(&scheduler);
            scheduler.host().click(button).unwrap();
            scheduler.flush().unwrap();
            assert_eq!(scheduler.component_states()[0].1.int("count"), Some(clicks));
        }

        let component = scheduler
            .current_fibers()
            .into_iter()
            .find(|id| scheduler.fiber(*id).map(|fiber| fiber.tag) == Some(WorkTag::ClassComponent))
            .unwrap();
        assert_eq!(scheduler.fiber(component).unwrap().component(), instance);
        assert_eq!(scheduler.component_count(), 1);
    }
}

// =============================================================================
// Scheduling
// =============================================================================

mod scheduling {
    use super::*;

    #[test]
    fn idle_loop_spreads_a_pass_over_slices() {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let mut scheduler = Scheduler::new(host, container);
        scheduler.render(list(0..10)).unwrap();

        // root + ul + 10 li + 10 text
        let slices = IdleLoop::new(SchedulerOptions::default())
            .run_with(&mut scheduler, || UnitBudget::new(3))
            .unwrap();
        assert_eq!(slices, 8);

        let stats = scheduler.last_pass().unwrap();
        assert_eq!(stats.units, 22);
        assert_eq!(stats.slices, 8);
        assert_eq!(scheduler.host().find_by_tag(container, "li").len(), 10);
    }

    #[test]
    fn nothing_is_attached_before_commit() {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let mut scheduler = Scheduler::new(host, container);
        scheduler.render(list(0..3)).unwrap();

        scheduler.work_loop(&UnitBudget::new(4)).unwrap();
        assert!(scheduler.is_rendering());
        assert!(scheduler.host().children(container).is_empty());
        assert!(scheduler
            .host()
            .mutations()
            .iter()
            .all(|mutation| mutation.op() != Op::AppendChild));

        scheduler.flush().unwrap();
        insta::assert_snapshot!(html(&scheduler), @"<ul><li>0</li><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn slice_limit_is_enforced() {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let mut scheduler = Scheduler::new(host, container);
        scheduler.render(list(0..10)).unwrap();

        let result = IdleLoop::new(SchedulerOptions::default().with_max_slices(2))
            .run_with(&mut scheduler, || UnitBudget::new(1));
        assert!(matches!(result, Err(LoomError::SliceLimit(2))));
        assert!(scheduler.is_rendering());
    }

    #[test]
    fn wall_clock_loop_settles() {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let mut scheduler = Scheduler::new(host, container);
        scheduler.render(list(0..50)).unwrap();

        let slices = IdleLoop::new(SchedulerOptions::default())
            .run(&mut scheduler)
            .unwrap();
        assert!(slices >= 1);
        assert_eq!(scheduler.host().find_by_tag(container, "li").len(), 50);
    }
}

// =============================================================================
// Failures
// =============================================================================

mod failures {
    use super::*;

    #[test]
    fn render_phase_failure_leaves_target_untouched() {
        let mut scheduler = mount(list(0..2)).unwrap();
        scheduler.host_mut().fail_next(Op::CreateElement);

        scheduler.render(list(0..3)).unwrap();
        let err = scheduler.flush().unwrap_err();
        assert!(matches!(err, LoomError::Host(_)));
        assert!(!scheduler.is_rendering());
        insta::assert_snapshot!(html(&scheduler), @"<ul><li>0</li><li>1</li></ul>");

        rerender(&mut scheduler, list(0..3));
        insta::assert_snapshot!(html(&scheduler), @"<ul><li>0</li><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn commit_failure_does_not_promote() {
        let mut scheduler = mount(Element::host("p").child("old")).unwrap();
        let root = scheduler.current_root();
        scheduler.host_mut().fail_next(Op::SetText);

        scheduler.render(Element::host("p").child("new")).unwrap();
        assert!(scheduler.flush().is_err());
        assert_eq!(scheduler.current_root(), root);
        insta::assert_snapshot!(html(&scheduler), @"<p>old</p>");

        rerender(&mut scheduler, Element::host("p").child("new"));
        insta::assert_snapshot!(html(&scheduler), @"<p>new</p>");
    }

    #[test]
    fn commit_failure_after_a_removal_remounts_on_retry() {
        let items = |texts: &[&str]| {
            Element::host("ul").children(texts.iter().map(|text| Element::host("li").child(*text)))
        };
        let mut scheduler = mount(items(&["a", "b"])).unwrap();
        scheduler.host_mut().fail_next(Op::SetText);

        scheduler.render(items(&["a2"])).unwrap();
        assert!(matches!(scheduler.flush(), Err(LoomError::Host(_))));
        assert_eq!(scheduler.current_root(), None);
        insta::assert_snapshot!(html(&scheduler), @"");

        rerender(&mut scheduler, items(&["a", "b"]));
        insta::assert_snapshot!(html(&scheduler), @"<ul><li>a</li><li>b</li></ul>");
        assert_eq!(
            scheduler.host().find_by_tag(*scheduler.container(), "li").len(),
            2
        );
    }

    #[test]
    fn text_without_content_is_malformed() {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let mut scheduler = Scheduler::new(host, container);
        scheduler
            .render(Element::new(filament_loom::ElementType::Text, Props::new()))
            .unwrap();
        assert!(matches!(
            scheduler.flush(),
            Err(LoomError::MalformedElement(_))
        ));
        assert_eq!(scheduler.host().node_count(), 1);
    }
}
