use serde::{Deserialize, Serialize};

use crate::error::{ReliabilityError, Result};

/// Parameters of one ant colony run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcoConfig {
    /// Iteration budget (Nmax)
    pub iterations: usize,
    /// Ant population size
    pub ants: usize,
    /// Links every candidate topology must keep
    pub max_links: usize,
    /// Deposit scale (Q)
    pub q: f64,
    /// Evaporation factor; values close to 1 keep more history
    pub rho: f64,
    /// Exponent (b) sharpening the reward `(r / r_elite)^b`
    pub reward_exponent: f64,
    /// Monte Carlo trials per ant evaluation
    pub mc_trials: u64,
    /// The elite is re-estimated with `mc_trials * final_trial_multiplier`
    /// trials on the last iteration
    pub final_trial_multiplier: u64,
    /// Random link draws allowed while building one ant before giving up
    pub max_construction_draws: u64,
    /// Let the elite deposit pheromone alongside the other ants
    pub elite_deposit: bool,
}

impl Default for AcoConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            ants: 20,
            max_links: 10,
            q: 1.0,
            rho: 0.8,
            reward_exponent: 1000.0,
            mc_trials: 10_000,
            final_trial_multiplier: 10,
            max_construction_draws: 1_000_000,
            elite_deposit: false,
        }
    }
}

impl AcoConfig {
    /// Check ranges against a graph with `edge_count` links
    pub fn validate(&self, edge_count: usize) -> Result<()> {
        if self.iterations == 0 {
            return Err(invalid("iterations must be positive"));
        }
        if self.ants == 0 {
            return Err(invalid("ants must be positive"));
        }
        if self.max_links == 0 {
            return Err(invalid("max_links must be positive"));
        }
        if self.max_links > edge_count {
            return Err(invalid(format!(
                "max_links ({}) exceeds the {} available links",
                self.max_links, edge_count
            )));
        }
        if !(self.rho > 0.0 && self.rho < 1.0) {
            return Err(invalid(format!("rho must lie in (0, 1), got {}", self.rho)));
        }
        if !(self.q > 0.0 && self.q.is_finite()) {
            return Err(invalid(format!("q must be positive, got {}", self.q)));
        }
        if !(self.reward_exponent >= 0.0 && self.reward_exponent.is_finite()) {
            return Err(invalid(format!(
                "reward_exponent must be non-negative, got {}",
                self.reward_exponent
            )));
        }
        if self.mc_trials == 0 || self.final_trial_multiplier == 0 {
            return Err(invalid("Monte Carlo trial counts must be positive"));
        }
        if self.max_construction_draws == 0 {
            return Err(invalid("max_construction_draws must be positive"));
        }
        Ok(())
    }

    pub fn final_trials(&self) -> u64 {
        self.mc_trials.saturating_mul(self.final_trial_multiplier)
    }
}

fn invalid(message: impl Into<String>) -> ReliabilityError {
    ReliabilityError::InvalidConfig(message.into())
}
