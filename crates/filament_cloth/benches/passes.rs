//! Render pass benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use filament_cloth::{mount, MemoryHost};
use filament_loom::{Component, Element, Props, RenderContext, Scheduler, State};

struct Ticker;

impl Component for Ticker {
    fn create(_props: &Props) -> Self {
        Ticker
    }

    fn initial_state(&self) -> State {
        State::new().with("tick", 0)
    }

    fn render(&self, cx: &RenderContext<'_>) -> Option<Element> {
        let tick = cx.state().int("tick").unwrap_or_default();
        Some(Element::host("ul").children((0..100).map(|n| Element::host("li").child(n + tick))))
    }
}

fn list(len: i64, offset: i64) -> Element {
    Element::host("ul").children((0..len).map(|n| Element::host("li").attr("data-n", n).child(n + offset)))
}

fn benchmark_mount(c: &mut Criterion) {
    c.bench_function("mount_list_100", |b| {
        b.iter(|| mount(black_box(list(100, 0))));
    });

    c.bench_function("mount_list_1000", |b| {
        b.iter(|| mount(black_box(list(1000, 0))));
    });
}

fn benchmark_rerender(c: &mut Criterion) {
    let mut scheduler: Scheduler<MemoryHost> = mount(list(100, 0)).unwrap();
    let mut offset = 0;

    c.bench_function("rerender_list_100", |b| {
        b.iter(|| {
            offset += 1;
            scheduler.render(list(100, offset)).unwrap();
            scheduler.flush().unwrap();
            scheduler.host_mut().take_mutations();
        });
    });

    c.bench_function("rerender_shrink_grow", |b| {
        let mut len = 100;
        b.iter(|| {
            len = if len == 100 { 50 } else { 100 };
            scheduler.render(list(len, 0)).unwrap();
            scheduler.flush().unwrap();
            scheduler.host_mut().take_mutations();
        });
    });
}

fn benchmark_state_update(c: &mut Criterion) {
    let mut scheduler = mount(Element::component::<Ticker>(Props::new())).unwrap();
    let component = scheduler
        .current_fibers()
        .into_iter()
        .find_map(|id| scheduler.state_handle(id))
        .unwrap();

    c.bench_function("state_update_list_100", |b| {
        b.iter(|| {
            component.update(|state| {
                State::new().with("tick", state.int("tick").unwrap_or_default() + 1)
            });
            scheduler.flush().unwrap();
            scheduler.host_mut().take_mutations();
        });
    });
}

criterion_group!(
    benches,
    benchmark_mount,
    benchmark_rerender,
    benchmark_state_update
);
criterion_main!(benches);
