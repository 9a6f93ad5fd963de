//! Reference Dijkstra used only to check the solver's output in integration
//! tests — not part of the crate's public surface (baseline comparators are
//! an external collaborator per the project scope).

use ordered_float::OrderedFloat;
use sssp_engine::Graph;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

pub fn dijkstra<G: Graph<OrderedFloat<f64>>>(graph: &G, source: usize) -> Vec<OrderedFloat<f64>> {
    let n = graph.vertex_count();
    let mut dist = vec![OrderedFloat(f64::INFINITY); n];
    dist[source] = OrderedFloat(0.0);

    let mut heap = BinaryHeap::new();
    heap.push(Reverse((dist[source], source)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for (v, weight) in graph.outgoing_edges(u) {
            let cand = d + weight;
            if cand < dist[v] {
                dist[v] = cand;
                heap.push(Reverse((cand, v)));
            }
        }
    }
    dist
}
