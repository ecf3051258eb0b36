use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use platynui_xnav::algebra::{DupFilterIterator, StepIterator, UnionIterator};
use platynui_xnav::arena::{attr, doc, elem, text};
use platynui_xnav::handle::NodeHandle;
use platynui_xnav::iter::AxisIterator;
use platynui_xnav::model::{Axis, NodeTest};
use platynui_xnav::router::DocumentRouter;
use platynui_xnav::sort::{SortLevel, SortSpec, sort_nodes};
use std::hint::black_box;
use std::sync::Arc;

fn create_document(sections: usize) -> (Arc<DocumentRouter>, NodeHandle) {
    let mut body = elem("body");
    for i in 0..sections {
        let mut section = elem("section").attr(attr("id", &format!("section-{i}")));
        for j in 0..20 {
            let div = elem("div")
                .attr(attr("data-index", &((j * 7 + i) % 97).to_string()))
                .child(elem("p").child(text(&format!("Paragraph {j} in section {i}"))))
                .child(elem("span").child(text("highlighted")));
            section = section.child(div);
        }
        body = body.child(section);
    }
    let router = Arc::new(DocumentRouter::new());
    let mask = router.register(Arc::new(doc().child(elem("html").child(body)).build())).unwrap();
    let root = router.root_handle(mask).unwrap();
    (router, root)
}

fn benchmark_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union");
    for sections in [10, 100] {
        let (router, root) = create_document(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &sections, |b, _| {
            b.iter(|| {
                let mut union = UnionIterator::new(router.clone())
                    .with_input(router.typed_axis_iterator(Axis::Descendant, NodeTest::name("p")))
                    .with_input(router.typed_axis_iterator(Axis::Descendant, NodeTest::name("span")))
                    .with_input(router.typed_axis_iterator(Axis::Descendant, NodeTest::name("div")));
                union.set_start_node(root);
                black_box(union.drain_nodes().len())
            });
        });
    }
    group.finish();
}

fn benchmark_dup_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dup_filter");
    for sections in [10, 100] {
        let (router, root) = create_document(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &sections, |b, _| {
            b.iter(|| {
                // ancestors of every paragraph: heavy duplication, reverse axis
                let step = StepIterator::new(
                    router.typed_axis_iterator(Axis::Descendant, NodeTest::name("p")),
                    router.axis_iterator(Axis::Ancestor),
                );
                let mut it = DupFilterIterator::new(Box::new(step));
                it.set_start_node(root);
                black_box(it.drain_nodes().len())
            });
        });
    }
    group.finish();
}

fn benchmark_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    let spec = SortSpec::builder()
        .level(SortLevel::number().select(|router, node| {
            router.first_attribute(node).map(|a| router.string_value(a)).unwrap_or_default()
        }))
        .level(SortLevel::text().descending())
        .build()
        .unwrap();
    for sections in [10, 100] {
        let (router, root) = create_document(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &sections, |b, _| {
            b.iter(|| {
                let mut divs = router.typed_axis_iterator(Axis::Descendant, NodeTest::name("div"));
                divs.set_start_node(root);
                let mut sorted = sort_nodes(&router, divs.as_mut(), &spec);
                black_box(sorted.last())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_union, benchmark_dup_filter, benchmark_sort);
criterion_main!(benches);
