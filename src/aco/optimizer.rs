//! The ant colony search loop.
//!
//! Every iteration rebuilds all ants except the elite by pheromone-biased
//! link sampling, estimates their reliability, keeps the most reliable one
//! as the elite and folds the rewards of the others into the pheromone
//! trails before evaporating them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::ant::Ant;
use super::config::AcoConfig;
use crate::error::{ReliabilityError, Result};
use crate::graph::Graph;
use crate::utils::cancel::{self, CancelToken};

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct AcoOutcome {
    /// Indices of the links kept by the elite, ascending
    pub best_edge_indices: Vec<usize>,
    /// Endpoints of those links
    pub best_links: Vec<(usize, usize)>,
    pub best_cost: f64,
    /// Elite reliability from the regular per-ant trial count
    pub best_reliability: f64,
    /// Elite reliability re-estimated with the larger final trial count
    pub final_reliability: f64,
    pub final_trials: u64,
    /// Elite reliability after each iteration
    pub history: Vec<f64>,
    pub iterations_run: usize,
    /// Ant evaluations performed, excluding the final re-estimate
    pub evaluations: usize,
}

/// Ant colony optimizer searching for the most reliable sub-topology
/// with a fixed number of links
#[derive(Debug)]
pub struct AcoOptimizer {
    config: AcoConfig,
    rng: StdRng,
    cancel: Option<CancelToken>,
}

impl AcoOptimizer {
    pub fn new(config: AcoConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
            cancel: None,
        }
    }

    /// Seed construction sampling and per-ant trial streams
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &AcoConfig {
        &self.config
    }

    /// Run the search on `graph`. Pheromone trails are reset to the prior
    /// first and hold the learned trails afterwards.
    pub fn run(&mut self, graph: &mut Graph) -> Result<AcoOutcome> {
        self.config.validate(graph.edge_count())?;
        let config = self.config.clone();

        log::info!(
            "Starting ACO with parameters: Nmax={} ants={} maxLinks={} b={} rho={} Q={}",
            config.iterations,
            config.ants,
            config.max_links,
            config.reward_exponent,
            config.rho,
            config.q
        );

        graph.hard_reset_edges();

        let mut population: Vec<Ant> = (0..config.ants)
            .map(|_| Ant::new(graph.edge_count()))
            .collect();
        let mut elite: Option<usize> = None;
        let mut history = Vec::with_capacity(config.iterations);
        let mut evaluations = 0;

        for iteration in 0..config.iterations {
            for (slot, ant) in population.iter_mut().enumerate() {
                if Some(slot) == elite {
                    continue;
                }
                cancel::check(self.cancel.as_ref())?;
                self.construct(graph, ant)?;
            }

            for (slot, ant) in population.iter_mut().enumerate() {
                if Some(slot) == elite && ant.latest_reliability().is_some() {
                    continue;
                }
                cancel::check(self.cancel.as_ref())?;
                let seed = self.rng.gen();
                ant.estimate_reliability(graph, config.mc_trials, seed, self.cancel.as_ref())?;
                evaluations += 1;
            }

            let best = select_elite(&population, elite);
            elite = Some(best);
            let elite_ant = &population[best];
            let elite_reliability = elite_ant.latest_reliability().unwrap_or(0.0);
            history.push(elite_reliability);
            log::info!(
                "Iteration {}/{}: best ant {} reliability: {} cost: {}",
                iteration + 1,
                config.iterations,
                best,
                elite_reliability,
                elite_ant.cost()
            );

            self.update_pheromones(graph, &population, best, elite_reliability)?;

            for (slot, ant) in population.iter_mut().enumerate() {
                if slot != best {
                    ant.clear();
                }
            }
        }

        let best = elite.ok_or_else(|| {
            ReliabilityError::InvalidConfig("no iterations were run".to_string())
        })?;
        let best_reliability = history.last().copied().unwrap_or(0.0);
        let final_trials = config.final_trials();
        let seed = self.rng.gen();
        let elite_ant = &mut population[best];
        let final_reliability =
            elite_ant.estimate_reliability(graph, final_trials, seed, self.cancel.as_ref())?;

        let mut best_edge_indices = elite_ant.selected_edges().to_vec();
        best_edge_indices.sort_unstable();
        let best_links = best_edge_indices
            .iter()
            .map(|&index| graph.edges()[index].nodes())
            .collect();

        log::info!(
            "ACO finished: {} links, cost {}, reliability {} from {} simulations",
            best_edge_indices.len(),
            elite_ant.cost(),
            final_reliability,
            final_trials
        );

        Ok(AcoOutcome {
            best_edge_indices,
            best_links,
            best_cost: elite_ant.cost(),
            best_reliability,
            final_reliability,
            final_trials,
            iterations_run: history.len(),
            history,
            evaluations,
        })
    }

    /// Accept random links with probability `tau[1] / sum(tau)` until the
    /// ant holds `max_links` of them.
    ///
    /// Fails with `ConstructionStalled` once `max_construction_draws`
    /// draws have not been enough.
    fn construct(&mut self, graph: &Graph, ant: &mut Ant) -> Result<()> {
        let edge_count = graph.edge_count();
        let required = self.config.max_links;
        let mut accepted = ant.selected_edges().len();
        let mut draws = 0u64;

        while accepted < required {
            if draws >= self.config.max_construction_draws {
                return Err(ReliabilityError::ConstructionStalled {
                    accepted,
                    required,
                    draws,
                });
            }
            draws += 1;

            let index = self.rng.gen_range(0..edge_count);
            if ant.is_selected(index) {
                continue;
            }
            let p = graph.edges()[index].selection_probability();
            if self.rng.gen::<f64>() < p {
                ant.add_edge(graph, index)?;
                accepted += 1;
            }
        }

        log::debug!("Built ant with {} links after {} draws", accepted, draws);
        Ok(())
    }

    /// Deposit `Q * (r / r_elite)^b` on every link at the level each ant
    /// gave it, then evaporate and flush on every link.
    fn update_pheromones(
        &self,
        graph: &mut Graph,
        population: &[Ant],
        elite: usize,
        elite_reliability: f64,
    ) -> Result<()> {
        let edges = graph.edges_mut();
        for (slot, ant) in population.iter().enumerate() {
            if slot == elite && !self.config.elite_deposit {
                continue;
            }
            let reliability = ant.latest_reliability().unwrap_or(0.0);
            let deposit = self.config.q
                * reward(reliability, elite_reliability, self.config.reward_exponent);
            for (index, edge) in edges.iter_mut().enumerate() {
                edge.add_delta_tau(ant.level(index), deposit)?;
            }
        }

        for edge in edges.iter_mut() {
            edge.update_tau(self.config.rho);
        }
        Ok(())
    }
}

/// Index of the most reliable ant. The previous elite wins ties.
fn select_elite(population: &[Ant], previous: Option<usize>) -> usize {
    let reliability = |slot: usize| population[slot].latest_reliability().unwrap_or(0.0);
    let mut best = previous;
    for slot in 0..population.len() {
        match best {
            Some(current) if reliability(slot) <= reliability(current) => {}
            _ => best = Some(slot),
        }
    }
    best.unwrap_or(0)
}

/// `(reliability / elite_reliability)^exponent`; an elite of zero means
/// every ant scored zero, which is rewarded equally.
fn reward(reliability: f64, elite_reliability: f64, exponent: f64) -> f64 {
    if elite_reliability <= 0.0 {
        return 1.0;
    }
    (reliability / elite_reliability).powf(exponent)
}
