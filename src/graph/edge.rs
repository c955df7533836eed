//! Unreliable undirected links and their pheromone trails.

use crate::error::{ReliabilityError, Result};

/// Number of pheromone levels a link can occupy in a solution.
///
/// Level 0 means the link is left out, level 1 means it is selected.
pub const PHEROMONE_LEVELS: usize = 2;

/// Level assigned to links chosen by an ant
pub const SELECTED_LEVEL: usize = 1;

/// Cost every link carries unless told otherwise
pub const DEFAULT_COST: f64 = 1.0;

/// Initial (uniform) pheromone strength
const TAU_PRIOR: f64 = 1.0;

/// Working state of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeState {
    /// Link is up
    Enabled,
    /// Link went down in the current random trial
    FailedThisTrial,
    /// Link was removed from the network and takes no part in any trial
    /// until the next hard reset
    PermanentlyDisabled,
}

/// An undirected link between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    low: usize,
    high: usize,
    reliability: f64,
    cost: f64,
    state: EdgeState,
    tau: [f64; PHEROMONE_LEVELS],
    delta_tau: [f64; PHEROMONE_LEVELS],
}

impl Edge {
    /// Create a link between `n1` and `n2`. Endpoints are stored in
    /// ascending order so `(1, 0)` and `(0, 1)` describe the same pair.
    pub fn new(n1: usize, n2: usize, reliability: f64, cost: f64) -> Self {
        let (low, high) = if n1 < n2 { (n1, n2) } else { (n2, n1) };
        Self {
            low,
            high,
            reliability,
            cost,
            state: EdgeState::Enabled,
            tau: [TAU_PRIOR; PHEROMONE_LEVELS],
            delta_tau: [0.0; PHEROMONE_LEVELS],
        }
    }

    /// Create a link with the default cost
    pub fn with_reliability(n1: usize, n2: usize, reliability: f64) -> Self {
        Self::new(n1, n2, reliability, DEFAULT_COST)
    }

    pub fn nodes(&self) -> (usize, usize) {
        (self.low, self.high)
    }

    pub fn reliability(&self) -> f64 {
        self.reliability
    }

    pub fn set_reliability(&mut self, reliability: f64) {
        self.reliability = reliability;
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn state(&self) -> EdgeState {
        self.state
    }

    /// Mark the link up or down for the current trial.
    ///
    /// A permanently disabled link stays disabled; only `hard_reset` brings it back.
    pub fn set_working(&mut self, working: bool) {
        if self.state == EdgeState::PermanentlyDisabled {
            return;
        }
        self.state = if working {
            EdgeState::Enabled
        } else {
            EdgeState::FailedThisTrial
        };
    }

    pub fn is_working(&self) -> bool {
        self.state == EdgeState::Enabled
    }

    pub fn is_disabled(&self) -> bool {
        self.state == EdgeState::PermanentlyDisabled
    }

    /// Remove the link from the network until the next hard reset
    pub fn disable(&mut self) {
        self.state = EdgeState::PermanentlyDisabled;
    }

    /// Restore the default cost and bring a failed link back up.
    /// Pheromone and permanent removal are left untouched.
    pub fn reset(&mut self) {
        self.cost = DEFAULT_COST;
        if self.state != EdgeState::PermanentlyDisabled {
            self.state = EdgeState::Enabled;
        }
    }

    /// Reset the pheromone trail to the uniform prior, re-enable the link
    /// and then apply `reset`.
    pub fn hard_reset(&mut self) {
        self.tau = [TAU_PRIOR; PHEROMONE_LEVELS];
        self.delta_tau = [0.0; PHEROMONE_LEVELS];
        self.state = EdgeState::Enabled;
        self.reset();
    }

    /// The endpoint opposite to `node`, or `None` if `node` is not an endpoint
    pub fn connecting_node(&self, node: usize) -> Option<usize> {
        if node == self.low {
            Some(self.high)
        } else if node == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    pub fn tau(&self, level: usize) -> Result<f64> {
        check_level(level)?;
        Ok(self.tau[level])
    }

    pub fn delta_tau(&self, level: usize) -> Result<f64> {
        check_level(level)?;
        Ok(self.delta_tau[level])
    }

    pub fn set_tau(&mut self, level: usize, tau: f64) -> Result<()> {
        check_level(level)?;
        self.tau[level] = tau;
        Ok(())
    }

    /// Accumulate a pending deposit for `level`
    pub fn add_delta_tau(&mut self, level: usize, delta: f64) -> Result<()> {
        check_level(level)?;
        self.delta_tau[level] += delta;
        Ok(())
    }

    /// Evaporate with factor `rho` and flush pending deposits:
    /// `tau = delta_tau + rho * tau`, then `delta_tau = 0`.
    pub fn update_tau(&mut self, rho: f64) {
        for (tau, delta) in self.tau.iter_mut().zip(self.delta_tau.iter_mut()) {
            *tau = *delta + rho * *tau;
            *delta = 0.0;
        }
    }

    pub fn sum_tau(&self) -> f64 {
        self.tau.iter().sum()
    }

    /// Probability that an ant picks this link: `tau[1] / sum(tau)`.
    ///
    /// # Panics
    /// Panics if every level's trail has decayed to zero.
    pub fn selection_probability(&self) -> f64 {
        let sum = self.sum_tau();
        assert!(
            sum > 0.0,
            "pheromone sum of edge {}-{} is zero",
            self.low,
            self.high
        );
        self.tau[SELECTED_LEVEL] / sum
    }
}

fn check_level(level: usize) -> Result<()> {
    if level >= PHEROMONE_LEVELS {
        return Err(ReliabilityError::LevelOutOfRange {
            level,
            levels: PHEROMONE_LEVELS,
        });
    }
    Ok(())
}
