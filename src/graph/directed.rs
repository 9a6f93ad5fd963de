use num_traits::{Float, Zero};
use std::fmt::Debug;

use crate::graph::traits::Graph;
use crate::{Error, Result};

/// A directed weighted graph stored as a dense adjacency list.
///
/// Vertices are indexed `0..vertex_count()`. Self-loops and parallel edges are
/// permitted and are not deduplicated — both are semantically meaningful for
/// shortest-path distances.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectedGraph<W>
where
    W: Float + Zero + Debug + Copy,
{
    out_adj: Vec<Vec<(usize, W)>>,
    in_degree: Vec<usize>,
}

impl<W> DirectedGraph<W>
where
    W: Float + Zero + Debug + Copy,
{
    /// Creates an empty graph with no vertices.
    pub fn new() -> Self {
        DirectedGraph {
            out_adj: Vec::new(),
            in_degree: Vec::new(),
        }
    }

    /// Creates a graph pre-populated with `vertices` isolated vertices.
    pub fn with_capacity(vertices: usize) -> Self {
        DirectedGraph {
            out_adj: vec![Vec::new(); vertices],
            in_degree: vec![0; vertices],
        }
    }

    /// Adds a new isolated vertex and returns its index.
    pub fn add_vertex(&mut self) -> usize {
        let id = self.out_adj.len();
        self.out_adj.push(Vec::new());
        self.in_degree.push(0);
        id
    }

    /// Adds a directed edge `from -> to` with the given non-negative finite weight.
    ///
    /// Rejects out-of-range endpoints and invalid weights rather than silently
    /// discarding the edge, per the invalid-input error taxonomy in §7 of the spec.
    pub fn add_edge(&mut self, from: usize, to: usize, weight: W) -> Result<()> {
        if from >= self.vertex_count() {
            return Err(Error::InvalidVertex(from));
        }
        if to >= self.vertex_count() {
            return Err(Error::InvalidVertex(to));
        }
        if !weight.is_finite() {
            return Err(Error::NonFiniteWeight(weight.to_f64().unwrap_or(f64::NAN)));
        }
        if weight < W::zero() {
            return Err(Error::NegativeWeight(weight.to_f64().unwrap_or(f64::NAN)));
        }

        self.out_adj[from].push((to, weight));
        self.in_degree[to] += 1;
        Ok(())
    }
}

impl<W> Default for DirectedGraph<W>
where
    W: Float + Zero + Debug + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<W> Graph<W> for DirectedGraph<W>
where
    W: Float + Zero + Debug + Copy,
{
    fn vertex_count(&self) -> usize {
        self.out_adj.len()
    }

    fn edge_count(&self) -> usize {
        self.out_adj.iter().map(|edges| edges.len()).sum()
    }

    fn outgoing_edges(&self, vertex: usize) -> Box<dyn Iterator<Item = (usize, W)> + '_> {
        match self.out_adj.get(vertex) {
            Some(edges) => Box::new(edges.iter().copied()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn out_degree(&self, vertex: usize) -> usize {
        self.out_adj.get(vertex).map_or(0, Vec::len)
    }

    fn in_degree(&self, vertex: usize) -> usize {
        self.in_degree.get(vertex).copied().unwrap_or(0)
    }
}
