//! Locator Operations Benchmarks
//!
//! Benchmarks for node look-up by selector, name and type, pattern matching
//! and menu path resolution.
//!
//! The scenes here are not attached to an event loop, so the look-ups run
//! directly on the bench thread.
//!
//! Run with: `cargo bench --bench locator_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use guicheck::locator::{self, Pattern, Selector};
use guicheck::mock::{MockMenuItem, MockNode};
use guicheck::{MenuPath, MenuRef, NodeRef};
use std::sync::Arc;

/// A tree `depth` levels deep with `width` children per container
fn scene(depth: usize, width: usize) -> Arc<MockNode> {
    fn fill(parent: &Arc<MockNode>, level: usize, depth: usize, width: usize) {
        for i in 0..width {
            let child = parent.add_child(
                MockNode::new(if level + 1 == depth { "Button" } else { "Pane" })
                    .with_id(format!("n{level}-{i}"))
                    .with_style_class(if i % 2 == 0 { "even" } else { "odd" }),
            );
            if level + 1 < depth {
                fill(&child, level + 1, depth, width);
            }
        }
    }
    let root = MockNode::new("VBox").with_id("root");
    fill(&root, 0, depth, width);
    root.add_child(MockNode::new("TextField").with_id("target"));
    root
}

fn bench_lookup_by_selector(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_by_selector");

    let sizes = vec![(2, 5, "2x5"), (3, 5, "3x5"), (4, 4, "4x4")];
    for (depth, width, name) in sizes {
        let root: NodeRef = scene(depth, width);
        let selectors = vec![
            ("css_id", Selector::css("#target")),
            ("css_class", Selector::css("Pane .odd")),
            ("name_regex", Selector::name("tar.*")),
            ("kind", Selector::kind("TextField")),
        ];
        for (kind, selector) in selectors {
            group.bench_with_input(
                BenchmarkId::new(kind, name),
                &selector,
                |bench, selector| {
                    bench.iter(|| {
                        let found = locator::lookup(&root, black_box(selector)).unwrap();
                        black_box(found);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_lookup_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_all");

    let root: NodeRef = scene(3, 6);
    for (name, selector) in [
        ("css_type", Selector::css("Button")),
        ("kind", Selector::kind("Button")),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &selector, |bench, sel| {
            bench.iter(|| {
                let found = locator::lookup_all(&root, black_box(sel)).unwrap();
                black_box(found.len());
            });
        });
    }

    group.finish();
}

fn bench_pattern_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_matching");

    let cases = vec![
        ("prefix", "Calc", "Calculator - untitled"),
        ("regex", "C.*or - .*", "Calculator - untitled"),
        ("miss", "Settings", "Calculator - untitled"),
    ];
    for (name, pattern, actual) in cases {
        let pattern = Pattern::new(pattern);
        group.bench_with_input(BenchmarkId::from_parameter(name), &actual, |bench, actual| {
            bench.iter(|| black_box(pattern.is_match(Some(black_box(actual))).unwrap()));
        });
    }

    group.finish();
}

fn bench_menu_path_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("menu_path_resolution");

    let menus: Vec<MenuRef> = (0..8)
        .map(|m| {
            let items = (0..12)
                .map(|i| MockMenuItem::item(&format!("item{i}")))
                .collect();
            let sub = MockMenuItem::menu(&format!("sub{m}"), items);
            MockMenuItem::menu(&format!("menu{m}"), vec![sub]) as MenuRef
        })
        .collect();

    for (name, path) in [
        ("first", "menu0/sub0/item0"),
        ("last", "menu7/sub7/item11"),
        ("missing", "menu7/sub7/nothing"),
    ] {
        let path = MenuPath::parse(path);
        group.bench_with_input(BenchmarkId::from_parameter(name), &path, |bench, path| {
            bench.iter(|| black_box(path.resolve(&menus).is_ok()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lookup_by_selector,
    bench_lookup_all,
    bench_pattern_matching,
    bench_menu_path_resolution
);
criterion_main!(benches);
