//! Percolation sweep.
//!
//! Charts reliability as a function of how many links are removed up
//! front (`f`) and the reliability `p` every remaining link is given.
//! Each `(f, p)` cell averages several repetitions, each removing a fresh
//! random set of links.

use serde::{Deserialize, Serialize};

use crate::error::{ReliabilityError, Result};
use crate::graph::Graph;
use crate::utils::cancel::{self, CancelToken};

/// Sweep parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PercolationConfig {
    /// Increment between probability columns
    pub step: f64,
    /// Repetitions averaged per cell
    pub repetitions: usize,
    /// Monte Carlo trials per repetition
    pub mc_trials: u64,
}

impl Default for PercolationConfig {
    fn default() -> Self {
        Self {
            step: 0.05,
            repetitions: 100,
            mc_trials: 1000,
        }
    }
}

impl PercolationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.step > 0.0 && self.step < 1.0) {
            return Err(ReliabilityError::InvalidConfig(format!(
                "percolation step must lie in (0, 1), got {}",
                self.step
            )));
        }
        if self.repetitions == 0 {
            return Err(ReliabilityError::InvalidConfig(
                "percolation repetitions must be positive".to_string(),
            ));
        }
        if self.mc_trials == 0 {
            return Err(ReliabilityError::InvalidTrialCount);
        }
        Ok(())
    }

    /// Probability columns `0, step, 2*step, ...` strictly below 1
    pub fn probabilities(&self) -> Vec<f64> {
        (0..)
            .map(|k| k as f64 * self.step)
            .take_while(|p| *p < 1.0 - 1e-9)
            .collect()
    }
}

/// Averaged reliability per (removed links, link reliability) cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercolationSurface {
    /// Column headings
    pub probabilities: Vec<f64>,
    /// `rows[f][k]` is the mean reliability with `f` links removed and
    /// link reliability `probabilities[k]`
    pub rows: Vec<Vec<f64>>,
}

impl PercolationSurface {
    /// Whitespace-separated table, one line per removed-link count
    pub fn to_table(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                let mut line: String = row.iter().map(|value| format!("{} ", value)).collect();
                line.push('\n');
                line
            })
            .collect()
    }
}

/// Run the sweep on a copy of `graph`; the caller's graph is left untouched.
///
/// Rows cover `f = 0 .. edge_count - 1`.
pub fn sweep(
    graph: &Graph,
    config: &PercolationConfig,
    cancel: Option<&CancelToken>,
) -> Result<PercolationSurface> {
    config.validate()?;
    let mut network = graph.clone();
    let probabilities = config.probabilities();
    let edge_count = network.edge_count();

    log::info!("Averaging over {} instances", config.repetitions);
    log::info!("Doing {} Monte Carlo steps per instance", config.mc_trials);

    let mut rows = Vec::with_capacity(edge_count);
    for removed in 0..edge_count {
        let mut row = Vec::with_capacity(probabilities.len());
        for &p in &probabilities {
            cancel::check(cancel)?;
            let mut total = 0.0;
            for _ in 0..config.repetitions {
                network.disable_x_edges(removed);
                network.set_edge_reliability(p)?;
                total += network.estimate_reliability_with(config.mc_trials, true, cancel)?;
                network.hard_reset_edges();
            }
            row.push(total / config.repetitions as f64);
        }
        rows.push(row);
        log::info!("Percentage done: {}", (removed + 1) * 100 / edge_count);
    }

    Ok(PercolationSurface {
        probabilities,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    fn ring(n: usize) -> Graph {
        let edges = (0..n)
            .map(|i| Edge::with_reliability(i, (i + 1) % n, 0.9))
            .collect();
        Graph::from_edges(edges).with_seed(17)
    }

    #[test]
    fn test_probability_columns() {
        let config = PercolationConfig::default();
        let columns = config.probabilities();
        assert_eq!(columns.len(), 20);
        assert_eq!(columns[0], 0.0);
        assert!((columns[19] - 0.95).abs() < 1e-12);

        let coarse = PercolationConfig {
            step: 0.25,
            ..PercolationConfig::default()
        };
        assert_eq!(coarse.probabilities(), vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_sweep_shape_and_bounds() {
        let graph = ring(4);
        let config = PercolationConfig {
            step: 0.25,
            repetitions: 3,
            mc_trials: 200,
        };
        let surface = sweep(&graph, &config, None).unwrap();
        assert_eq!(surface.rows.len(), 4);
        assert!(surface.rows.iter().all(|row| row.len() == 4));

        // p = 0 disconnects everything
        assert!(surface.rows.iter().all(|row| row[0] == 0.0));
        // removing two links of a 4-ring always disconnects it
        assert!(surface.rows[2].iter().all(|&r| r == 0.0));
        assert!(surface.rows[3].iter().all(|&r| r == 0.0));
        // with nothing removed reliability grows with p
        assert!(surface.rows[0][3] > surface.rows[0][1]);
    }

    #[test]
    fn test_sweep_leaves_graph_untouched() {
        let graph = ring(3);
        let config = PercolationConfig {
            step: 0.5,
            repetitions: 1,
            mc_trials: 10,
        };
        sweep(&graph, &config, None).unwrap();
        assert!(graph.edges().iter().all(|e| e.reliability() == 0.9 && e.is_working()));
    }

    #[test]
    fn test_table_format() {
        let surface = PercolationSurface {
            probabilities: vec![0.0, 0.5],
            rows: vec![vec![0.0, 0.25], vec![0.0, 0.0]],
        };
        assert_eq!(surface.to_table(), "0 0.25 \n0 0 \n");
    }

    #[test]
    fn test_invalid_config() {
        let graph = ring(3);
        let config = PercolationConfig {
            repetitions: 0,
            ..PercolationConfig::default()
        };
        assert!(sweep(&graph, &config, None).is_err());
    }
}
