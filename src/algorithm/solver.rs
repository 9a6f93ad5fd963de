use log::{debug, trace};
use num_traits::{Float, NumCast, Zero};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt::Debug;

use crate::data_structures::BlockSequence;
use crate::graph::Graph;
use crate::{Error, Result};

/// Tolerance for shortest-path-forest edge detection in [`Solver::find_pivots`].
/// Tuned for weight ranges up to roughly 10^4 and graphs up to roughly 10^5 vertices;
/// scale proportionally for other ranges.
fn eps<W: Float + NumCast>() -> W {
    <W as NumCast>::from(1e-9_f64).unwrap_or_else(W::epsilon)
}

/// Saturating `2^exp` as a `usize`, used for the level-dependent block capacity
/// and the per-level result-set cap — both grow doubly exponentially in the
/// recursion level and must not wrap on deep recursions.
fn pow2_sat(exp: usize) -> usize {
    1usize.checked_shl(exp as u32).unwrap_or(usize::MAX)
}

/// The recursive bounded multi-source shortest path solver.
///
/// Owns the distance vector for the lifetime of a [`Solver::run`] call; all
/// recursive levels of `BMSSP` read and write the same array; see §5 of the
/// design notes on why no per-level snapshot is taken.
#[derive(Debug)]
pub struct Solver<'g, W, G>
where
    W: Float + Zero + Debug + Copy,
    G: Graph<W>,
{
    graph: &'g G,
    dist: Vec<W>,
    k: usize,
    t: usize,
    l: usize,
}

impl<'g, W, G> Solver<'g, W, G>
where
    W: Float + Zero + Debug + Copy + Ord,
    G: Graph<W>,
{
    /// Builds a solver over `graph`, deriving `k`, `t`, and `L` from its vertex count.
    pub fn new(graph: &'g G) -> Self {
        let n = graph.vertex_count();
        let ln_n = (n.max(2) as f64).ln();
        let k = (ln_n.powf(1.0 / 3.0).floor() as usize).max(2);
        let t = (ln_n.powf(2.0 / 3.0).floor() as usize).max(2);
        let l = ((ln_n / t as f64).ceil() as usize).max(1);
        debug!("solver parameters: n={n} k={k} t={t} L={l}");

        Solver {
            graph,
            dist: vec![W::infinity(); n],
            k,
            t,
            l,
        }
    }

    /// Bellman-Ford round count used by `FindPivots`.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Block-capacity / recursion-width exponent base.
    pub fn t(&self) -> usize {
        self.t
    }

    /// Top-level recursion depth.
    pub fn l(&self) -> usize {
        self.l
    }

    /// Runs the solver from `source`, returning a view over the final distance vector.
    pub fn run(&mut self, source: usize) -> Result<&[W]> {
        let n = self.graph.vertex_count();
        if n == 0 {
            return Err(Error::EmptyGraph);
        }
        if source >= n {
            return Err(Error::SourceOutOfRange(source));
        }

        for d in &mut self.dist {
            *d = W::infinity();
        }
        self.dist[source] = W::zero();
        debug!("run: source={source} n={n} levels={}", self.l);

        self.bmssp(self.l, W::infinity(), &[source]);
        Ok(&self.dist)
    }

    /// Current distance vector, valid after [`Solver::run`] returns.
    pub fn distances(&self) -> &[W] {
        &self.dist
    }

    /// §4.3.1 `FindPivots`: k rounds of Bellman-Ford relaxation from `sources`,
    /// followed by shortest-path-forest subtree sizing to separate pivots from witnesses.
    fn find_pivots(&mut self, bound: W, sources: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let mut in_w = HashSet::with_capacity(sources.len() * 2);
        let mut w = Vec::with_capacity(sources.len() * 2);
        for &s in sources {
            if in_w.insert(s) {
                w.push(s);
            }
        }

        let mut frontier = sources.to_vec();
        for _ in 0..self.k {
            if frontier.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for &u in &frontier {
                let edges: Vec<_> = self.graph.outgoing_edges(u).collect();
                for (v, weight) in edges {
                    let cand = self.dist[u] + weight;
                    if cand < self.dist[v] {
                        self.dist[v] = cand;
                        if cand < bound && in_w.insert(v) {
                            w.push(v);
                            next.push(v);
                        }
                    }
                }
            }
            if w.len() > self.k * sources.len() {
                trace!("find_pivots: early exit, |W|={} > k*|S|", w.len());
                return (sources.to_vec(), w);
            }
            frontier = next;
        }

        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for &u in &w {
            let edges: Vec<_> = self.graph.outgoing_edges(u).collect();
            for (v, weight) in edges {
                if in_w.contains(&v) && (self.dist[v] - (self.dist[u] + weight)).abs() < eps() {
                    children.entry(u).or_default().push(v);
                }
            }
        }

        let mut size_memo: HashMap<usize, isize> = HashMap::new();
        let pivots = sources
            .iter()
            .copied()
            .filter(|&s| self.subtree_size(s, &children, &mut size_memo) >= self.k)
            .collect();
        (pivots, w)
    }

    /// Iterative (explicit-stack) subtree size of `root` in the forest `children`.
    /// `memo` is shared across every root a single [`Solver::find_pivots`] call
    /// queries, so a descendant reachable from multiple sources is sized once and
    /// reused rather than re-walked per source. Its three-state markers (absent /
    /// `ON_STACK` / computed size) also treat a revisited on-stack vertex as a leaf
    /// rather than recursing — see the design notes on floating-point equality
    /// chains in the degree-reduction cycles.
    fn subtree_size(
        &self,
        root: usize,
        children: &HashMap<usize, Vec<usize>>,
        memo: &mut HashMap<usize, isize>,
    ) -> usize {
        const ON_STACK: isize = -1;

        if let Some(&size) = memo.get(&root) {
            if size != ON_STACK {
                return size as usize;
            }
        }

        struct Frame {
            vertex: usize,
            next_child: usize,
            acc: usize,
        }

        let state = memo;
        state.insert(root, ON_STACK);
        let mut stack = vec![Frame {
            vertex: root,
            next_child: 0,
            acc: 1,
        }];

        while let Some(top) = stack.len().checked_sub(1) {
            let vertex = stack[top].vertex;
            let kids_len = children.get(&vertex).map_or(0, Vec::len);

            if stack[top].next_child < kids_len {
                let child = children[&vertex][stack[top].next_child];
                stack[top].next_child += 1;
                match state.get(&child).copied() {
                    Some(ON_STACK) => stack[top].acc += 1,
                    Some(computed) => stack[top].acc += computed as usize,
                    None => {
                        state.insert(child, ON_STACK);
                        stack.push(Frame {
                            vertex: child,
                            next_child: 0,
                            acc: 1,
                        });
                    }
                }
            } else {
                let frame = stack.pop().unwrap();
                state.insert(frame.vertex, frame.acc as isize);
                if let Some(parent) = stack.len().checked_sub(1) {
                    stack[parent].acc += frame.acc;
                }
            }
        }

        *state.get(&root).unwrap() as usize
    }

    /// §4.3.2 `BaseCase`: a bounded multi-source Dijkstra limited to k+1 settled vertices.
    fn base_case(&mut self, bound: W, sources: &[usize]) -> (W, Vec<usize>) {
        let mut heap: BinaryHeap<Reverse<(W, usize)>> = BinaryHeap::with_capacity(sources.len());
        for &s in sources {
            heap.push(Reverse((self.dist[s], s)));
        }

        let mut settled = Vec::new();
        let mut in_settled = HashSet::new();

        while in_settled.len() <= self.k + 1 {
            let Some(Reverse((key, u))) = heap.pop() else {
                break;
            };
            // A vertex is relaxed exactly once: later pops of the same vertex are
            // either stale (a smaller key already won) or a tied re-push from a
            // zero-weight cycle, and skipping both keeps the loop's total work
            // bounded even when ties would otherwise requeue forever.
            if in_settled.contains(&u) || key > self.dist[u] {
                continue;
            }
            in_settled.insert(u);
            settled.push(u);
            let edges: Vec<_> = self.graph.outgoing_edges(u).collect();
            for (v, weight) in edges {
                let cand = self.dist[u] + weight;
                if cand <= self.dist[v] && cand < bound {
                    self.dist[v] = cand;
                    heap.push(Reverse((cand, v)));
                }
            }
        }

        if settled.len() <= self.k {
            return (bound, settled);
        }

        let new_bound = settled
            .iter()
            .map(|&u| self.dist[u])
            .fold(self.dist[settled[0]], |acc, v| if v > acc { v } else { acc });
        let u = settled
            .into_iter()
            .filter(|&u| self.dist[u] < new_bound)
            .collect();
        (new_bound, u)
    }

    /// §4.3.3 `BMSSP`: the recursive driver, level `l` down to the base case at `l == 0`.
    fn bmssp(&mut self, level: usize, bound: W, sources: &[usize]) -> (W, Vec<usize>) {
        if level == 0 {
            return self.base_case(bound, sources);
        }

        let (pivots, w) = self.find_pivots(bound, sources);
        if pivots.is_empty() {
            let u: Vec<usize> = w.into_iter().filter(|&x| self.dist[x] < bound).collect();
            return (bound, u);
        }

        let capacity = pow2_sat(self.t.saturating_mul(level - 1)).max(1);
        let mut d = BlockSequence::new(capacity, bound);
        // Tracks the value each vertex was last placed into `d` at, so a vertex
        // already queued at its current distance is never requeued at the same
        // value. Without this, a zero-weight cycle at the base level can tie
        // every relaxation and reinsert the same pivot through `Si` forever.
        let mut last_queued: HashMap<usize, W> = HashMap::new();
        for &x in &pivots {
            d.insert(x, self.dist[x]);
            last_queued.insert(x, self.dist[x]);
        }

        let limit = self.k.saturating_mul(pow2_sat(self.t.saturating_mul(level)));
        let mut u: HashSet<usize> = HashSet::new();

        while u.len() < limit && !d.is_empty() {
            let (si, bi) = d.pull();
            let (b_prime_i, u_i) = self.bmssp(level - 1, bi, &si);
            u.extend(u_i.iter().copied());

            let mut batch: Vec<(usize, W)> = Vec::new();
            for &vtx in &u_i {
                let edges: Vec<_> = self.graph.outgoing_edges(vtx).collect();
                for (to, weight) in edges {
                    let cand = self.dist[vtx] + weight;
                    if cand <= self.dist[to] {
                        self.dist[to] = cand;
                        let improved = last_queued.get(&to).map_or(true, |&prev| cand < prev);
                        if cand >= bi && cand < bound {
                            if improved {
                                d.insert(to, cand);
                                last_queued.insert(to, cand);
                            }
                        } else if cand >= b_prime_i && cand < bi && improved {
                            batch.push((to, cand));
                            last_queued.insert(to, cand);
                        }
                    }
                }
            }
            for &x in &si {
                let dx = self.dist[x];
                if dx >= b_prime_i && dx < bi && last_queued.get(&x).map_or(true, |&prev| dx < prev) {
                    batch.push((x, dx));
                    last_queued.insert(x, dx);
                }
            }
            d.batch_prepend(batch);

            if u.len() > limit {
                trace!("bmssp: level={level} early exit, |U|={} > limit={limit}", u.len());
                for &wv in &w {
                    if self.dist[wv] < b_prime_i {
                        u.insert(wv);
                    }
                }
                return (b_prime_i, u.into_iter().collect());
            }
        }

        for &wv in &w {
            if self.dist[wv] < bound {
                u.insert(wv);
            }
        }
        (bound, u.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DirectedGraph;
    use ordered_float::OrderedFloat;

    fn w(v: f64) -> OrderedFloat<f64> {
        OrderedFloat(v)
    }

    fn dist_f64(dist: &[OrderedFloat<f64>]) -> Vec<f64> {
        dist.iter().map(|d| d.into_inner()).collect()
    }

    #[test]
    fn five_vertex_dag() {
        let mut g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::with_capacity(5);
        g.add_edge(0, 1, w(10.0)).unwrap();
        g.add_edge(0, 2, w(5.0)).unwrap();
        g.add_edge(1, 2, w(2.0)).unwrap();
        g.add_edge(1, 3, w(1.0)).unwrap();
        g.add_edge(2, 3, w(9.0)).unwrap();
        g.add_edge(2, 4, w(2.0)).unwrap();
        g.add_edge(3, 4, w(4.0)).unwrap();

        let mut solver = Solver::new(&g);
        let dist = solver.run(0).unwrap();
        assert_eq!(dist_f64(dist), vec![0.0, 7.0, 5.0, 8.0, 7.0]);
    }

    #[test]
    fn single_isolated_vertex() {
        let g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::with_capacity(1);
        let mut solver = Solver::new(&g);
        let dist = solver.run(0).unwrap();
        assert_eq!(dist_f64(dist), vec![0.0]);
    }

    #[test]
    fn disconnected_component_stays_unreached() {
        let mut g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::with_capacity(4);
        g.add_edge(0, 1, w(1.0)).unwrap();
        let mut solver = Solver::new(&g);
        let dist = solver.run(0).unwrap();
        assert_eq!(dist[0], w(0.0));
        assert_eq!(dist[1], w(1.0));
        assert!(dist[2].is_infinite());
        assert!(dist[3].is_infinite());
    }

    #[test]
    fn parallel_edges_take_the_minimum() {
        let mut g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::with_capacity(2);
        g.add_edge(0, 1, w(5.0)).unwrap();
        g.add_edge(0, 1, w(2.0)).unwrap();
        g.add_edge(0, 1, w(7.0)).unwrap();
        let mut solver = Solver::new(&g);
        let dist = solver.run(0).unwrap();
        assert_eq!(dist_f64(dist), vec![0.0, 2.0]);
    }

    #[test]
    fn zero_weight_cycle_shares_one_distance() {
        let mut g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::with_capacity(3);
        g.add_edge(0, 1, w(0.0)).unwrap();
        g.add_edge(1, 2, w(0.0)).unwrap();
        g.add_edge(2, 0, w(0.0)).unwrap();
        let mut solver = Solver::new(&g);
        let dist = solver.run(0).unwrap();
        assert_eq!(dist_f64(dist), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn self_loop_does_not_change_own_distance() {
        let mut g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::with_capacity(1);
        g.add_edge(0, 0, w(3.0)).unwrap();
        let mut solver = Solver::new(&g);
        let dist = solver.run(0).unwrap();
        assert_eq!(dist[0], w(0.0));
    }

    #[test]
    fn rejects_out_of_range_source() {
        let g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::with_capacity(2);
        let mut solver = Solver::new(&g);
        assert_eq!(solver.run(5), Err(Error::SourceOutOfRange(5)));
    }

    #[test]
    fn rejects_empty_graph() {
        let g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::new();
        let mut solver = Solver::new(&g);
        assert_eq!(solver.run(0), Err(Error::EmptyGraph));
    }

    #[test]
    fn derived_parameters_match_the_formula_for_a_known_n() {
        // ln(1000) ≈ 6.9078: k = floor(ln_n^(1/3)).max(2) = 2,
        // t = floor(ln_n^(2/3)).max(2) = 3, L = ceil(ln_n / t).max(1) = 3.
        let g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::with_capacity(1_000);
        let solver = Solver::new(&g);
        assert_eq!(solver.k(), 2);
        assert_eq!(solver.t(), 3);
        assert_eq!(solver.l(), 3);
    }

    #[test]
    fn triangle_closure_holds_on_termination() {
        let mut g: DirectedGraph<OrderedFloat<f64>> = DirectedGraph::with_capacity(6);
        g.add_edge(0, 1, w(4.0)).unwrap();
        g.add_edge(0, 2, w(1.0)).unwrap();
        g.add_edge(2, 1, w(1.0)).unwrap();
        g.add_edge(1, 3, w(2.0)).unwrap();
        g.add_edge(3, 4, w(3.0)).unwrap();
        g.add_edge(2, 4, w(9.0)).unwrap();
        g.add_edge(4, 5, w(1.0)).unwrap();

        let mut solver = Solver::new(&g);
        let dist = solver.run(0).unwrap().to_vec();
        for u in 0..g.vertex_count() {
            if dist[u].is_infinite() {
                continue;
            }
            for (v, weight) in g.outgoing_edges(u) {
                assert!(dist[v] <= dist[u] + weight, "triangle inequality violated at ({u}, {v})");
            }
        }
    }
}
