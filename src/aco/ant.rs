//! Candidate topologies.

use crate::error::{ReliabilityError, Result};
use crate::graph::{Graph, SELECTED_LEVEL};
use crate::utils::cancel::CancelToken;

/// One candidate sub-topology: the set of links it keeps, its cost and
/// (once evaluated) its reliability.
///
/// An ant only references the graph's links by index. Its selection is
/// independent of the graph's working flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Ant {
    levels: Vec<usize>,
    selected: Vec<usize>,
    cost: f64,
    cached_reliability: Option<f64>,
}

impl Ant {
    /// Empty ant for a graph with `edge_count` links
    pub fn new(edge_count: usize) -> Self {
        Self {
            levels: vec![0; edge_count],
            selected: Vec::new(),
            cost: 0.0,
            cached_reliability: None,
        }
    }

    /// Forget the current solution so the slot can be rebuilt
    pub fn clear(&mut self) {
        self.levels.fill(0);
        self.selected.clear();
        self.cost = 0.0;
        self.cached_reliability = None;
    }

    /// Select link `index` of `graph` (level 1) and add its cost
    pub fn add_edge(&mut self, graph: &Graph, index: usize) -> Result<()> {
        let edge = graph.edge(index)?;
        if index >= self.levels.len() {
            return Err(ReliabilityError::EdgeIndexOutOfRange {
                index,
                len: self.levels.len(),
            });
        }
        if self.levels[index] == SELECTED_LEVEL {
            return Ok(());
        }
        self.levels[index] = SELECTED_LEVEL;
        self.selected.push(index);
        self.cost += edge.cost();
        self.cached_reliability = None;
        Ok(())
    }

    /// Pheromone level this ant assigned to link `index`
    pub fn level(&self, index: usize) -> usize {
        self.levels[index]
    }

    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.levels[index] == SELECTED_LEVEL
    }

    /// Selected link indices in selection order
    pub fn selected_edges(&self) -> &[usize] {
        &self.selected
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// The cached estimate, `None` until evaluated
    pub fn latest_reliability(&self) -> Option<f64> {
        self.cached_reliability
    }

    /// Estimate the reliability of the selected sub-topology. Links this
    /// ant left out are absent from every trial.
    pub fn estimate_reliability(
        &mut self,
        graph: &Graph,
        trials: u64,
        seed: u64,
        cancel: Option<&CancelToken>,
    ) -> Result<f64> {
        let subset: Vec<bool> = self.levels.iter().map(|&l| l == SELECTED_LEVEL).collect();
        let reliability = graph.estimate_subset_reliability(&subset, trials, seed, cancel)?;
        self.cached_reliability = Some(reliability);
        Ok(reliability)
    }
}
