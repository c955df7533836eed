//! Run configuration.
//!
//! Every field has a default, so a YAML file only needs to name what it
//! changes:
//!
//! ```yaml
//! seed: 42
//! deadline: "10m"
//! estimate:
//!   trials: 100000
//! aco:
//!   iterations: 50
//!   ants: 20
//!   max_links: 12
//! percolation:
//!   step: 0.05
//! ```

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::aco::AcoConfig;
use crate::percolation::PercolationConfig;
use crate::utils::cancel::CancelToken;

/// Reliability estimation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimateConfig {
    pub trials: u64,
    /// Reliability given to GML links that carry none
    pub default_reliability: f64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            trials: 100_000,
            default_reliability: 0.9,
        }
    }
}

/// Top-level run configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Seed for every random stream; absent means fresh entropy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Worker threads for Monte Carlo trials (0 = one per core)
    pub threads: usize,
    /// Abort the run once this much wall time has passed
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Duration>,
    pub estimate: EstimateConfig,
    pub aco: AcoConfig,
    pub percolation: PercolationConfig,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid estimate configuration: {0}")]
    InvalidEstimate(String),
    #[error("Invalid ACO configuration: {0}")]
    InvalidAco(String),
    #[error("Invalid percolation configuration: {0}")]
    InvalidPercolation(String),
}

impl RunConfig {
    /// Range checks that do not depend on the loaded graph. The ACO link
    /// budget is checked against the graph when the optimizer starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.estimate.trials == 0 {
            return Err(ConfigError::InvalidEstimate(
                "trials must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.estimate.default_reliability) {
            return Err(ConfigError::InvalidEstimate(format!(
                "default_reliability {} outside [0, 1]",
                self.estimate.default_reliability
            )));
        }
        self.aco
            .validate(usize::MAX)
            .map_err(|e| ConfigError::InvalidAco(e.to_string()))?;
        self.percolation
            .validate()
            .map_err(|e| ConfigError::InvalidPercolation(e.to_string()))?;
        Ok(())
    }

    /// Cancellation token honoring the configured deadline
    pub fn cancel_token(&self) -> CancelToken {
        match self.deadline {
            Some(deadline) => CancelToken::with_timeout(deadline),
            None => CancelToken::new(),
        }
    }
}

/// Load and validate a run configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<RunConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;
    let config: RunConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: RunConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.aco.rho, 0.8);
        assert_eq!(config.percolation.repetitions, 100);
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
seed: 7
threads: 2
deadline: "1m 30s"
estimate:
  trials: 5000
aco:
  iterations: 3
  ants: 4
  max_links: 5
  elite_deposit: true
percolation:
  step: 0.1
  repetitions: 2
"#;
        let config: RunConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.deadline, Some(Duration::from_secs(90)));
        assert_eq!(config.estimate.trials, 5000);
        assert_eq!(config.aco.max_links, 5);
        assert!(config.aco.elite_deposit);
        assert_eq!(config.percolation.mc_trials, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let config: RunConfig = serde_yaml::from_str("estimate:\n  trials: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEstimate(_))));

        let config: RunConfig = serde_yaml::from_str("aco:\n  ants: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAco(_))));

        let config: RunConfig = serde_yaml::from_str("percolation:\n  step: 1.5\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPercolation(_))));

        assert!(serde_yaml::from_str::<RunConfig>("colony: {}\n").is_err());
    }

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "seed: 3\naco:\n  ants: 2").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.aco.ants, 2);

        assert!(load_config(Path::new("/nonexistent/run.yaml")).is_err());
    }
}
