//! Ant colony optimization of sparse, reliable sub-topologies.

pub mod ant;
pub mod config;
pub mod optimizer;

pub use ant::Ant;
pub use config::AcoConfig;
pub use optimizer::{AcoOptimizer, AcoOutcome};
