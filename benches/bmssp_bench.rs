use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sssp_engine::{DirectedGraph, Solver};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use sssp_engine::Graph;

fn random_sparse_graph(n: usize, m: usize, seed: u64) -> DirectedGraph<OrderedFloat<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = DirectedGraph::with_capacity(n);
    for _ in 0..m {
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        let weight = OrderedFloat(rng.gen_range(1.0..101.0));
        g.add_edge(u, v, weight).unwrap();
    }
    g
}

fn reference_dijkstra(g: &DirectedGraph<OrderedFloat<f64>>, source: usize) -> Vec<OrderedFloat<f64>> {
    let n = g.vertex_count();
    let mut dist = vec![OrderedFloat(f64::INFINITY); n];
    dist[source] = OrderedFloat(0.0);
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((dist[source], source)));
    while let Some(Reverse((d, u))) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for (v, weight) in g.outgoing_edges(u) {
            let cand = d + weight;
            if cand < dist[v] {
                dist[v] = cand;
                heap.push(Reverse((cand, v)));
            }
        }
    }
    dist
}

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("sssp");
    for &n in &[1_000usize, 10_000, 50_000] {
        let m = n * 3;
        let graph = random_sparse_graph(n, m, 7);

        group.bench_with_input(BenchmarkId::new("bmssp", n), &graph, |b, graph| {
            b.iter(|| {
                let mut solver = Solver::new(graph);
                black_box(solver.run(0).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("dijkstra", n), &graph, |b, graph| {
            b.iter(|| black_box(reference_dijkstra(graph, 0)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solver);
criterion_main!(benches);
