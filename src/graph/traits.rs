use num_traits::{Float, Zero};
use std::fmt::Debug;

/// A directed weighted graph with vertices indexed `0..vertex_count()`.
///
/// The solver is generic over this trait rather than tied to [`super::DirectedGraph`]
/// so it can run directly over the output of [`super::transform`] or any other
/// adjacency-list representation a caller supplies.
pub trait Graph<W>
where
    W: Float + Zero + Debug + Copy,
{
    /// Number of vertices in the graph.
    fn vertex_count(&self) -> usize;

    /// Total number of directed edges in the graph.
    fn edge_count(&self) -> usize;

    /// Outgoing `(destination, weight)` edges of `vertex`, in insertion order.
    fn outgoing_edges(&self, vertex: usize) -> Box<dyn Iterator<Item = (usize, W)> + '_>;

    /// Number of outgoing edges of `vertex`.
    fn out_degree(&self, vertex: usize) -> usize;

    /// Number of incoming edges of `vertex`.
    fn in_degree(&self, vertex: usize) -> usize;
}
