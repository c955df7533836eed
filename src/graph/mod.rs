//! Network of unreliable links.
//!
//! A [`Graph`] owns its edges (insertion order is the stable edge index
//! used by ants and reports) and a node -> incident-edge index that is
//! rebuilt after every structural change.

pub mod edge;
pub mod estimator;
pub mod walk;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use edge::{Edge, EdgeState, DEFAULT_COST, PHEROMONE_LEVELS, SELECTED_LEVEL};
pub use estimator::{standard_error, TrialTopology};

use crate::error::{ReliabilityError, Result};
use crate::utils::cancel::CancelToken;

/// Trials used when a cached reliability is requested but missing
pub const DEFAULT_LAZY_TRIALS: u64 = 1000;

/// Largest node id a loader accepts; adjacency is indexed densely by id
pub const MAX_NODE_ID: usize = (1 << 24) - 1;

/// Result of [`Graph::add_edge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddEdge {
    /// Appended at this index
    Added(usize),
    /// An identical link already sits at this index; nothing changed
    AlreadyPresent(usize),
}

/// Per-edge pheromone summary line
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EdgeSummary {
    pub low: usize,
    pub high: usize,
    pub reliability: f64,
    pub selection_probability: f64,
}

#[derive(Debug, Clone)]
pub struct Graph {
    edges: Vec<Edge>,
    connecting_edges: Vec<Vec<usize>>,
    biggest_node_id: Option<usize>,
    latest_estimated_reliability: Option<f64>,
    rng: StdRng,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            connecting_edges: Vec::new(),
            biggest_node_id: None,
            latest_estimated_reliability: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Build a graph from a complete edge list, indexing adjacency once
    pub fn from_edges(edges: Vec<Edge>) -> Self {
        let mut graph = Self::new();
        graph.biggest_node_id = edges.iter().map(|e| e.nodes().1).max();
        graph.edges = edges;
        graph.rebuild_adjacency();
        graph
    }

    /// Like [`Graph::from_edges`], but every node in `0..node_count` must be
    /// reached, including nodes no link touches
    pub fn from_edges_with_nodes(edges: Vec<Edge>, node_count: usize) -> Self {
        let mut graph = Self::new();
        let declared = node_count.checked_sub(1);
        let touched = edges.iter().map(|e| e.nodes().1).max();
        graph.biggest_node_id = declared.max(touched);
        graph.edges = edges;
        graph.rebuild_adjacency();
        graph
    }

    /// Reseed the random source used by estimates and edge disabling
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.set_seed(seed);
        self
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> Result<&Edge> {
        self.edges
            .get(index)
            .ok_or(ReliabilityError::EdgeIndexOutOfRange {
                index,
                len: self.edges.len(),
            })
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn biggest_node_id(&self) -> Option<usize> {
        self.biggest_node_id
    }

    /// Nodes `0..=biggest_node_id`, all of which must be reached for a
    /// trial to count as connected
    pub fn node_count(&self) -> usize {
        self.biggest_node_id.map_or(0, |id| id.saturating_add(1))
    }

    /// Incident edge indices of `node`
    pub fn connecting_edges(&self, node: usize) -> &[usize] {
        self.connecting_edges
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The last estimate, if the structure has not changed since
    pub fn cached_reliability(&self) -> Option<f64> {
        self.latest_estimated_reliability
    }

    /// Append `edge` unless an identical link is already present
    pub fn add_edge(&mut self, edge: Edge) -> AddEdge {
        if let Some(index) = self.edges.iter().position(|e| *e == edge) {
            log::debug!("Edge {:?} already exists at index {}", edge.nodes(), index);
            return AddEdge::AlreadyPresent(index);
        }

        let (low, high) = edge.nodes();
        let index = self.edges.len();
        self.edges.push(edge);
        self.biggest_node_id = Some(self.biggest_node_id.map_or(high, |id| id.max(high)));
        if self.connecting_edges.len() < self.node_count() {
            self.connecting_edges.resize(self.node_count(), Vec::new());
        }
        self.connecting_edges[low].push(index);
        self.connecting_edges[high].push(index);

        self.latest_estimated_reliability = None;
        AddEdge::Added(index)
    }

    /// Overwrite every link's reliability
    pub fn set_edge_reliability(&mut self, reliability: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&reliability) {
            return Err(ReliabilityError::InvalidReliability(reliability));
        }
        for edge in &mut self.edges {
            edge.set_reliability(reliability);
        }
        self.latest_estimated_reliability = None;
        Ok(())
    }

    /// Reset every link, then permanently disable `count` distinct links
    /// picked uniformly at random.
    ///
    /// `count` is clamped to the number of links. Picks that land on an
    /// already disabled link are redrawn, so the expected number of draws
    /// grows like a coupon collector as `count` approaches the edge count;
    /// it stays finite for any finite graph.
    pub fn disable_x_edges(&mut self, count: usize) {
        let mut remaining = count.min(self.edges.len());
        for edge in &mut self.edges {
            edge.reset();
        }
        // reset() keeps earlier removals, which count toward the quota
        remaining = remaining.saturating_sub(self.edges.iter().filter(|e| e.is_disabled()).count());

        while remaining > 0 {
            let index = self.rng.gen_range(0..self.edges.len());
            if self.edges[index].is_working() {
                self.edges[index].disable();
                remaining -= 1;
            }
        }
        self.latest_estimated_reliability = None;
    }

    pub fn reset_edges(&mut self) {
        for edge in &mut self.edges {
            edge.reset();
        }
    }

    /// Restore pheromone priors and bring every link back
    pub fn hard_reset_edges(&mut self) {
        for edge in &mut self.edges {
            edge.hard_reset();
        }
        self.latest_estimated_reliability = None;
    }

    /// Estimate all-terminal reliability from `trials` Monte Carlo trials
    /// and cache the result. Unless `quiet`, the estimate is logged.
    pub fn estimate_reliability(&mut self, trials: u64, quiet: bool) -> Result<f64> {
        self.estimate_reliability_with(trials, quiet, None)
    }

    pub fn estimate_reliability_with(
        &mut self,
        trials: u64,
        quiet: bool,
        cancel: Option<&CancelToken>,
    ) -> Result<f64> {
        let seed = self.rng.gen();
        let reliability = estimator::estimate(self.trial_topology(None), trials, seed, cancel)?;
        if !quiet {
            log::info!(
                "All-terminal reliability = {}, calculated from {} simulations",
                reliability,
                trials
            );
        }
        self.latest_estimated_reliability = Some(reliability);
        Ok(reliability)
    }

    /// Estimate restricted to the links flagged in `subset`; other links are
    /// treated as absent. Nothing is cached on the graph.
    pub fn estimate_subset_reliability(
        &self,
        subset: &[bool],
        trials: u64,
        seed: u64,
        cancel: Option<&CancelToken>,
    ) -> Result<f64> {
        estimator::estimate(self.trial_topology(Some(subset)), trials, seed, cancel)
    }

    /// Cached estimate, computed with [`DEFAULT_LAZY_TRIALS`] when missing
    pub fn latest_reliability(&mut self) -> Result<f64> {
        match self.latest_estimated_reliability {
            Some(reliability) => Ok(reliability),
            None => self.estimate_reliability(DEFAULT_LAZY_TRIALS, true),
        }
    }

    /// Run one trial in place: reset every link, then fail each one with
    /// probability `1 - reliability` on the live working flags.
    pub fn sample_failures(&mut self) {
        for edge in &mut self.edges {
            edge.reset();
            let survives = self.rng.gen::<f64>() < edge.reliability();
            if !survives {
                edge.set_working(false);
            }
        }
    }

    /// Whether every node is reachable from node 0 over currently working links
    pub fn all_nodes_reachable(&self) -> bool {
        let node_count = self.node_count();
        if node_count == 0 {
            return false;
        }
        let mut visited = vec![false; node_count];
        let reached = walk::walk_from(0, &self.connecting_edges, &self.edges, &mut visited, |e| {
            self.edges[e].is_working()
        });
        reached == node_count
    }

    /// Every link with its endpoints and current selection probability
    pub fn pheromone_summary(&self) -> Vec<EdgeSummary> {
        self.edges
            .iter()
            .map(|edge| {
                let (low, high) = edge.nodes();
                EdgeSummary {
                    low,
                    high,
                    reliability: edge.reliability(),
                    selection_probability: edge.selection_probability(),
                }
            })
            .collect()
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    pub(crate) fn next_seed(&mut self) -> u64 {
        self.rng.gen()
    }

    fn trial_topology<'a>(&'a self, subset: Option<&'a [bool]>) -> TrialTopology<'a> {
        TrialTopology {
            edges: &self.edges,
            adjacency: &self.connecting_edges,
            node_count: self.node_count(),
            subset,
        }
    }

    fn rebuild_adjacency(&mut self) {
        self.connecting_edges = walk::build_adjacency(&self.edges, self.node_count());
        self.latest_estimated_reliability = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize, reliability: f64) -> Graph {
        let edges = (0..n)
            .map(|i| Edge::with_reliability(i, (i + 1) % n, reliability))
            .collect();
        Graph::from_edges(edges).with_seed(42)
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let mut graph = Graph::new();
        let edge = Edge::with_reliability(0, 1, 0.9);
        assert_eq!(graph.add_edge(edge.clone()), AddEdge::Added(0));
        assert_eq!(graph.add_edge(edge), AddEdge::AlreadyPresent(0));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.add_edge(Edge::with_reliability(2, 1, 0.9)), AddEdge::Added(1));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.connecting_edges(1), &[0, 1]);
        assert_eq!(graph.connecting_edges(2), &[1]);
    }

    #[test]
    fn test_add_edge_invalidates_cache() {
        let mut graph = ring(3, 1.0);
        graph.estimate_reliability(10, true).unwrap();
        assert_eq!(graph.cached_reliability(), Some(1.0));
        graph.add_edge(Edge::with_reliability(0, 3, 1.0));
        assert_eq!(graph.cached_reliability(), None);
    }

    #[test]
    fn test_adjacency_lists_both_endpoints() {
        let graph = ring(4, 0.5);
        for (index, edge) in graph.edges().iter().enumerate() {
            let (low, high) = edge.nodes();
            assert!(graph.connecting_edges(low).contains(&index));
            assert!(graph.connecting_edges(high).contains(&index));
        }
    }

    #[test]
    fn test_perfect_links_give_certain_connectivity() {
        let mut graph = ring(6, 1.0);
        for trials in [1, 7, 5000] {
            assert_eq!(graph.estimate_reliability(trials, true).unwrap(), 1.0);
        }
    }

    #[test]
    fn test_dead_bridge_gives_zero() {
        let mut graph = ring(4, 1.0);
        graph.add_edge(Edge::with_reliability(3, 4, 0.0));
        assert_eq!(graph.estimate_reliability(2000, true).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_trials_is_error() {
        let mut graph = ring(3, 0.5);
        assert!(matches!(
            graph.estimate_reliability(0, true),
            Err(ReliabilityError::InvalidTrialCount)
        ));
        assert!(matches!(
            Graph::new().estimate_reliability(10, true),
            Err(ReliabilityError::EmptyGraph)
        ));
    }

    #[test]
    fn test_disable_x_edges_clamps() {
        let mut graph = ring(5, 1.0);
        graph.disable_x_edges(2);
        assert_eq!(graph.edges().iter().filter(|e| e.is_disabled()).count(), 2);

        graph.hard_reset_edges();
        graph.disable_x_edges(50);
        assert!(graph.edges().iter().all(Edge::is_disabled));
        assert_eq!(graph.estimate_reliability(10, true).unwrap(), 0.0);

        graph.hard_reset_edges();
        assert!(graph.edges().iter().all(Edge::is_working));
        assert_eq!(graph.estimate_reliability(10, true).unwrap(), 1.0);
    }

    #[test]
    fn test_declared_isolated_node_must_be_reached() {
        let edges = vec![
            Edge::with_reliability(0, 1, 1.0),
            Edge::with_reliability(1, 2, 1.0),
        ];
        let mut graph = Graph::from_edges_with_nodes(edges.clone(), 4).with_seed(1);
        assert_eq!(graph.node_count(), 4);
        assert!(graph.connecting_edges(3).is_empty());
        assert_eq!(graph.estimate_reliability(100, true).unwrap(), 0.0);

        // a smaller declared count never hides linked nodes
        let graph = Graph::from_edges_with_nodes(edges, 1);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_set_edge_reliability() {
        let mut graph = ring(4, 0.3);
        graph.set_edge_reliability(1.0).unwrap();
        assert!(graph.edges().iter().all(|e| e.reliability() == 1.0));
        assert!(graph.set_edge_reliability(1.5).is_err());
    }

    #[test]
    fn test_in_place_trial() {
        let mut graph = ring(4, 1.0);
        graph.sample_failures();
        assert!(graph.all_nodes_reachable());

        graph.set_edge_reliability(0.0).unwrap();
        graph.sample_failures();
        assert!(graph.edges().iter().all(|e| e.state() == EdgeState::FailedThisTrial));
        assert!(!graph.all_nodes_reachable());
    }

    #[test]
    fn test_latest_reliability_is_lazy() {
        let mut graph = ring(3, 1.0);
        assert_eq!(graph.cached_reliability(), None);
        assert_eq!(graph.latest_reliability().unwrap(), 1.0);
        assert_eq!(graph.cached_reliability(), Some(1.0));
    }

    #[test]
    fn test_pheromone_summary() {
        let mut graph = ring(3, 0.9);
        graph.edges_mut()[1].set_tau(SELECTED_LEVEL, 3.0).unwrap();
        let summary = graph.pheromone_summary();
        assert_eq!(summary.len(), 3);
        assert_eq!((summary[1].low, summary[1].high), (1, 2));
        assert!((summary[1].selection_probability - 0.75).abs() < 1e-12);
        assert!((summary[0].selection_probability - 0.5).abs() < 1e-12);
    }
}
