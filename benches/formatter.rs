use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nodegraph_format::config::{FormatterConfig, ParameterStyle};
use nodegraph_format::ir::{Graph, NodeId, PinDirection, PinKind};
use nodegraph_format::{FormatSession, ParameterFormatter};
use std::hint::black_box;

/// A root fed by a full tree of pure nodes, `fan_in` inputs per node.
fn input_tree(depth: usize, fan_in: usize) -> (Graph, NodeId) {
    let mut graph = Graph::new();
    let root = graph.add_node("Root", 2000.0, 0.0, 160.0, 80.0);
    let mut frontier = vec![root];
    let mut count = 0usize;
    for _ in 0..depth {
        let mut next = Vec::new();
        for parent in frontier {
            for slot in 0..fan_in {
                let parent_in = graph.add_pin(
                    parent,
                    &format!("in{slot}"),
                    PinDirection::Input,
                    PinKind::Parameter,
                ).unwrap();
                let child = graph.add_node(&format!("N{count}"), 0.0, 0.0, 120.0, 60.0);
                count += 1;
                let child_out = graph.add_pin(child, "out", PinDirection::Output, PinKind::Parameter).unwrap();
                let _ = graph.link(child_out, parent_in);
                next.push(child);
            }
        }
        frontier = next;
    }
    (graph, root)
}

/// A single input chain, the shape helixing stacks into a column.
fn input_chain(len: usize) -> (Graph, NodeId) {
    let mut graph = Graph::new();
    let root = graph.add_node("Root", 2000.0, 0.0, 160.0, 80.0);
    let mut consumer = graph.add_pin(root, "in", PinDirection::Input, PinKind::Parameter).unwrap();
    for i in 0..len {
        let node = graph.add_node(&format!("N{i}"), 0.0, 0.0, 120.0, 40.0);
        let out = graph.add_pin(node, "out", PinDirection::Output, PinKind::Parameter).unwrap();
        let _ = graph.link(out, consumer);
        consumer = graph.add_pin(node, "in", PinDirection::Input, PinKind::Parameter).unwrap();
    }
    (graph, root)
}

fn bench_full_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_node");
    for (depth, fan_in) in [(2usize, 3usize), (3, 3), (4, 3), (3, 5)] {
        let name = format!("tree_{depth}x{fan_in}");
        let (graph, root) = input_tree(depth, fan_in);
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, graph| {
            b.iter(|| {
                let mut graph = graph.clone();
                let mut formatter = ParameterFormatter::new(root, FormatterConfig::default());
                formatter.format_node(black_box(&mut graph));
                black_box(formatter.formatted_nodes().len());
            });
        });
    }
    group.finish();
}

fn bench_helixing(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_node_helixing");
    let config = FormatterConfig {
        parameter_style: ParameterStyle::Helixing,
        limit_helixing_height: false,
        ..FormatterConfig::default()
    };
    for len in [8usize, 32, 128] {
        let (graph, root) = input_chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &graph, |b, graph| {
            b.iter(|| {
                let mut graph = graph.clone();
                let mut formatter = ParameterFormatter::new(root, config.clone());
                formatter.format_node(black_box(&mut graph));
                black_box(formatter.is_helixing());
            });
        });
    }
    group.finish();
}

fn bench_cached_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_node_cached");
    for (depth, fan_in) in [(3usize, 3usize), (4, 3)] {
        let name = format!("tree_{depth}x{fan_in}");
        let (mut graph, root) = input_tree(depth, fan_in);
        let mut session = FormatSession::new(FormatterConfig::default());
        session.format(&mut graph, root);
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                let formatter = session.format(black_box(&mut graph), root);
                black_box(formatter.node_offsets().len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_format, bench_helixing, bench_cached_replay);
criterion_main!(benches);
