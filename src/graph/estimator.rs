//! Monte Carlo all-terminal reliability estimation.
//!
//! Each trial draws an independent Bernoulli failure for every candidate
//! link and walks the surviving links from node 0; the trial succeeds when
//! every node is reached. Trials are split into fixed-size chunks that run
//! on the rayon pool. Chunk `k` draws from its own `StdRng` seeded from the
//! call's base seed and `k`, so a given base seed yields the same count no
//! matter how many worker threads run. Workers never touch the shared
//! edges' working flags; each keeps private scratch state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::edge::Edge;
use super::walk::walk_from;
use crate::error::{ReliabilityError, Result};
use crate::utils::cancel::{self, CancelToken};

/// Trials per independently seeded chunk
pub const TRIALS_PER_CHUNK: u64 = 1024;

/// Read-only view of the topology a set of trials runs over
#[derive(Debug, Clone, Copy)]
pub struct TrialTopology<'a> {
    pub edges: &'a [Edge],
    pub adjacency: &'a [Vec<usize>],
    pub node_count: usize,
    /// Links taking part; `None` means every link not permanently disabled
    pub subset: Option<&'a [bool]>,
}

impl TrialTopology<'_> {
    fn is_candidate(&self, index: usize) -> bool {
        let present = self.subset.map_or(true, |subset| subset[index]);
        present && !self.edges[index].is_disabled()
    }
}

/// Count the trials (out of `trials`) in which all nodes stay connected
pub fn count_connected_trials(
    topology: TrialTopology<'_>,
    trials: u64,
    base_seed: u64,
    cancel: Option<&CancelToken>,
) -> Result<u64> {
    if trials == 0 {
        return Err(ReliabilityError::InvalidTrialCount);
    }
    if topology.node_count == 0 {
        return Err(ReliabilityError::EmptyGraph);
    }
    if let Some(subset) = topology.subset {
        if subset.len() != topology.edges.len() {
            return Err(ReliabilityError::EdgeIndexOutOfRange {
                index: subset.len(),
                len: topology.edges.len(),
            });
        }
    }

    let chunks = trials.div_ceil(TRIALS_PER_CHUNK);
    (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * TRIALS_PER_CHUNK;
            let len = TRIALS_PER_CHUNK.min(trials - start);
            run_chunk(topology, len, chunk_seed(base_seed, chunk), cancel)
        })
        .try_reduce(|| 0, |a, b| Ok(a + b))
}

/// Estimate all-terminal reliability as `successes / trials`
pub fn estimate(
    topology: TrialTopology<'_>,
    trials: u64,
    base_seed: u64,
    cancel: Option<&CancelToken>,
) -> Result<f64> {
    let successes = count_connected_trials(topology, trials, base_seed, cancel)?;
    Ok(successes as f64 / trials as f64)
}

fn run_chunk(
    topology: TrialTopology<'_>,
    trials: u64,
    seed: u64,
    cancel: Option<&CancelToken>,
) -> Result<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut alive = vec![false; topology.edges.len()];
    let mut visited = vec![false; topology.node_count];
    let mut successes = 0;

    for _ in 0..trials {
        cancel::check(cancel)?;

        for (index, edge) in topology.edges.iter().enumerate() {
            alive[index] = topology.is_candidate(index) && rng.gen::<f64>() < edge.reliability();
        }

        visited.fill(false);
        let reached = walk_from(0, topology.adjacency, topology.edges, &mut visited, |e| alive[e]);
        if reached == topology.node_count {
            successes += 1;
        }
    }

    Ok(successes)
}

fn chunk_seed(base_seed: u64, chunk: u64) -> u64 {
    base_seed ^ (chunk + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Standard error of a reliability estimate from `trials` samples
pub fn standard_error(estimate: f64, trials: u64) -> f64 {
    (estimate * (1.0 - estimate) / trials as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::walk::build_adjacency;

    fn topology<'a>(
        edges: &'a [Edge],
        adjacency: &'a [Vec<usize>],
        node_count: usize,
    ) -> TrialTopology<'a> {
        TrialTopology {
            edges,
            adjacency,
            node_count,
            subset: None,
        }
    }

    #[test]
    fn test_zero_trials_rejected() {
        let edges = vec![Edge::with_reliability(0, 1, 0.5)];
        let adjacency = build_adjacency(&edges, 2);
        let result = count_connected_trials(topology(&edges, &adjacency, 2), 0, 1, None);
        assert!(matches!(result, Err(ReliabilityError::InvalidTrialCount)));
    }

    #[test]
    fn test_same_seed_same_count() {
        let edges = vec![
            Edge::with_reliability(0, 1, 0.7),
            Edge::with_reliability(1, 2, 0.6),
            Edge::with_reliability(0, 2, 0.5),
        ];
        let adjacency = build_adjacency(&edges, 3);
        let topo = topology(&edges, &adjacency, 3);
        let a = count_connected_trials(topo, 5000, 99, None).unwrap();
        let b = count_connected_trials(topo, 5000, 99, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_count_independent_of_thread_count() {
        let edges = vec![
            Edge::with_reliability(0, 1, 0.7),
            Edge::with_reliability(1, 2, 0.6),
            Edge::with_reliability(0, 2, 0.5),
        ];
        let adjacency = build_adjacency(&edges, 3);
        let topo = topology(&edges, &adjacency, 3);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap();
        let single = pool.install(|| count_connected_trials(topo, 10_000, 7, None).unwrap());
        let many = count_connected_trials(topo, 10_000, 7, None).unwrap();
        assert_eq!(single, many);
    }

    #[test]
    fn test_subset_excludes_links() {
        let edges = vec![
            Edge::with_reliability(0, 1, 1.0),
            Edge::with_reliability(1, 2, 1.0),
            Edge::with_reliability(0, 2, 1.0),
        ];
        let adjacency = build_adjacency(&edges, 3);
        let subset = [true, false, false];
        let topo = TrialTopology {
            subset: Some(&subset[..]),
            ..topology(&edges, &adjacency, 3)
        };
        assert_eq!(estimate(topo, 100, 1, None).unwrap(), 0.0);

        let subset = [true, false, true];
        let topo = TrialTopology {
            subset: Some(&subset[..]),
            ..topology(&edges, &adjacency, 3)
        };
        assert_eq!(estimate(topo, 100, 1, None).unwrap(), 1.0);
    }

    #[test]
    fn test_cancelled_token_stops_estimate() {
        let edges = vec![Edge::with_reliability(0, 1, 0.5)];
        let adjacency = build_adjacency(&edges, 2);
        let token = CancelToken::new();
        token.cancel();
        let result = estimate(topology(&edges, &adjacency, 2), 10, 1, Some(&token));
        assert!(matches!(result, Err(ReliabilityError::Cancelled)));
    }

    #[test]
    fn test_standard_error() {
        assert_eq!(standard_error(1.0, 100), 0.0);
        assert!((standard_error(0.5, 100) - 0.05).abs() < 1e-12);
    }
}
