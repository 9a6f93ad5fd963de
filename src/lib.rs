//! `sssp_engine` — a bounded multi-source shortest path (BMSSP) solver.
//!
//! This crate implements the algorithm described in "Breaking the Sorting Barrier
//! for Directed Single-Source Shortest Paths" by Duan, Mao, Mao, Shu and Yin (2025):
//! a deterministic O(m log^(2/3) n) solution for single-source shortest paths on
//! directed graphs with real non-negative edge weights, beating Dijkstra's
//! O(m + n log n) comparison-addition bound.
//!
//! Three pieces compose the core: a degree-reduction [`graph`] transform, a
//! block-based priority queue ([`data_structures::BlockSequence`]), and the
//! recursive [`algorithm::Solver`] that ties them together.

pub mod algorithm;
pub mod data_structures;
pub mod graph;

pub use algorithm::Solver;
pub use graph::{transform, DegreeReducedGraph, DirectedGraph, Graph};

/// Errors surfaced at the crate's API boundaries.
///
/// Internal algorithm invariants (forest-cycle guards, stale heap entries) are
/// design-eliminated rather than propagated — only invalid input or an
/// out-of-range request reach a caller as an `Error`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("vertex index {0} is out of range")]
    InvalidVertex(usize),

    #[error("edge weight {0} is negative")]
    NegativeWeight(f64),

    #[error("edge weight {0} is not finite")]
    NonFiniteWeight(f64),

    #[error("graph has no vertices")]
    EmptyGraph,

    #[error("source vertex {0} is out of range")]
    SourceOutOfRange(usize),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
