use log::debug;
use num_traits::{Float, Zero};
use std::fmt::Debug;

use crate::graph::directed::DirectedGraph;
use crate::graph::traits::Graph;
use crate::{Error, Result};

/// The result of [`transform`]: a bounded-degree graph plus the mappings needed
/// to move between original and transformed vertex ids.
#[derive(Debug, PartialEq)]
pub struct DegreeReducedGraph<W>
where
    W: Float + Zero + Debug + Copy,
{
    /// The transformed graph G', with in-/out-degree ≤ 2 per vertex.
    pub graph: DirectedGraph<W>,
    /// `start[v]` is the first transformed vertex of original vertex `v`'s cycle.
    pub start: Vec<usize>,
    /// `origin_of[x]` is the original vertex owning transformed vertex `x`.
    pub origin_of: Vec<usize>,
}

/// Converts a graph to a bounded-degree equivalent that preserves shortest-path
/// distances, per §4.1.
///
/// Every original vertex `v` is expanded into a directed zero-weight cycle of
/// `max(1, indeg(v) + outdeg(v))` transformed vertices. Each real edge
/// `(u, v, w)` is realized as a single transformed edge from one unused
/// outgoing slot of `u`'s cycle to one unused incoming slot of `v`'s cycle, so
/// every transformed vertex carries at most one real edge in addition to its
/// two cycle edges.
pub fn transform<W, G>(g: &G) -> Result<DegreeReducedGraph<W>>
where
    W: Float + Zero + Debug + Copy,
    G: Graph<W>,
{
    let n = g.vertex_count();
    if n == 0 {
        return Err(Error::EmptyGraph);
    }

    let mut out = DirectedGraph::new();
    let mut start = vec![0usize; n];
    let mut origin_of = Vec::with_capacity(2 * g.edge_count() + n);

    for v in 0..n {
        let out_deg = g.out_degree(v);
        let in_deg = g.in_degree(v);
        let cycle_len = (out_deg + in_deg).max(1);

        start[v] = out.vertex_count();
        for _ in 0..cycle_len {
            out.add_vertex();
            origin_of.push(v);
        }
        for i in 0..cycle_len {
            let from = start[v] + i;
            let to = start[v] + (i + 1) % cycle_len;
            out.add_edge(from, to, W::zero())?;
        }
    }

    // Outgoing slots occupy [0, outdeg(u)) of u's cycle; incoming slots occupy
    // [outdeg(v), outdeg(v)+indeg(v)) of v's cycle, so the two counters never
    // collide on the same transformed vertex.
    let mut out_slot = vec![0usize; n];
    let mut in_slot: Vec<usize> = (0..n).map(|v| g.out_degree(v)).collect();

    for u in 0..n {
        for (v, w) in g.outgoing_edges(u) {
            let from = start[u] + out_slot[u];
            out_slot[u] += 1;
            let to = start[v] + in_slot[v];
            in_slot[v] += 1;
            out.add_edge(from, to, w)?;
        }
    }

    debug!(
        "transform: {} original vertices / {} original edges -> {} transformed vertices / {} transformed edges",
        n,
        g.edge_count(),
        out.vertex_count(),
        out.edge_count()
    );

    Ok(DegreeReducedGraph {
        graph: out,
        start,
        origin_of,
    })
}

/// Projects distances over the transformed id space back to the original one:
/// `orig_dist[v] = dist[start[v]]`.
pub fn map_distances<W: Copy>(dist: &[W], start: &[usize]) -> Vec<W> {
    start.iter().map(|&s| dist[s]).collect()
}
