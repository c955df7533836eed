//! # ReliaSim - Network reliability estimation and topology search
//!
//! This library estimates the all-terminal reliability of a network whose
//! links fail independently, and searches for sparse sub-topologies that
//! keep reliability high under a link budget.
//!
//! ## Overview
//!
//! - **Monte Carlo estimation**: every trial fails each link with
//!   probability `1 - reliability` and checks whether all nodes are still
//!   mutually reachable. Trials run in parallel on seeded, independent
//!   random streams, so a fixed seed always reproduces the same estimate.
//! - **Ant colony optimization**: ants sample link subsets biased by
//!   per-link pheromone trails, the most reliable subset is kept as the
//!   elite, and trails are reinforced by reward and decayed by evaporation.
//! - **Percolation sweeps**: reliability charted against the number of
//!   links removed up front and the reliability of those that remain.
//!
//! ## Architecture
//!
//! - `graph`: links, pheromone trails, adjacency, connectivity walk and
//!   the Monte Carlo estimator
//! - `aco`: ants, optimizer configuration and the search loop
//! - `percolation`: the parameter sweep
//! - `loader`: edge-list and GML ingestion
//! - `config`: YAML run configuration
//! - `report`: JSON and text output
//! - `utils`: cancellation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use reliasim::aco::{AcoConfig, AcoOptimizer};
//! use reliasim::loader::load_graph;
//! use std::path::Path;
//!
//! let mut graph = load_graph(Path::new("data/1_cell.nwk"), 0.9)?.with_seed(42);
//! let reliability = graph.estimate_reliability(100_000, false)?;
//!
//! let config = AcoConfig { max_links: 12, ..AcoConfig::default() };
//! let outcome = AcoOptimizer::new(config).with_seed(42).run(&mut graph)?;
//! println!("{} -> {}", reliability, outcome.final_reliability);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Library operations return typed errors (`ReliabilityError`,
//! `LoadError`, `ConfigError`) built with `thiserror`; the binary reports
//! them through `color_eyre`.

pub mod aco;
pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod percolation;
pub mod report;
pub mod utils;

pub use error::{LoadError, ReliabilityError};
pub use graph::{Edge, Graph};
