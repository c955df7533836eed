//! Error types for reliability estimation, optimization and graph loading.

use std::path::PathBuf;

/// Errors raised by the estimator, the pheromone model and the optimizer
#[derive(Debug, thiserror::Error)]
pub enum ReliabilityError {
    #[error("Monte Carlo trial count must be positive")]
    InvalidTrialCount,
    #[error("Pheromone level {level} out of range (edges carry {levels} levels)")]
    LevelOutOfRange { level: usize, levels: usize },
    #[error("Graph has no nodes to connect")]
    EmptyGraph,
    #[error("Edge index {index} out of range for {len} edges")]
    EdgeIndexOutOfRange { index: usize, len: usize },
    #[error("Reliability {0} is outside [0, 1]")]
    InvalidReliability(f64),
    #[error("Invalid optimizer configuration: {0}")]
    InvalidConfig(String),
    #[error("Ant construction stalled: accepted {accepted} of {required} links after {draws} draws")]
    ConstructionStalled {
        accepted: usize,
        required: usize,
        draws: u64,
    },
    #[error("Operation cancelled")]
    Cancelled,
}

/// Errors raised while reading an edge source
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Incorrect file, could not find a type specifier (expected e.g. \"type: edges\")")]
    MissingTypeHeader,
    #[error("Could not determine type of file from header '{0}'")]
    UnknownFileType(String),
    #[error("No prob field found in file, line: '{0}'")]
    MissingProbability(String),
    #[error("Malformed edge on line {line}: '{content}'")]
    MalformedLine { line: usize, content: String },
    #[error("Invalid GML: {0}")]
    Gml(String),
    #[error("Edge references undeclared node {0}")]
    UnknownNode(u32),
    #[error("No edges found in {0}")]
    Empty(String),
}

pub type Result<T, E = ReliabilityError> = std::result::Result<T, E>;
