//! Solver configuration.
//!
//! Controls the search budget, the stopping mode, the warm start, and the
//! number of parallel workers. Can be built in code or loaded from TOML.
//!
//! ```
//! use u_jobshop::cp::SolverConfig;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     time_limit_ms = 5000
//!     node_limit = 1000000
//!     stop_after_first = false
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit_ms, Some(5000));
//! assert!(config.warm_start);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Branch-and-bound solver configuration.
///
/// The default searches without any budget until optimality is proven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget in milliseconds. `None` = unlimited.
    pub time_limit_ms: Option<u64>,
    /// Maximum number of search nodes. `None` = unlimited.
    pub node_limit: Option<u64>,
    /// Stop at the first complete schedule instead of proving optimality.
    pub stop_after_first: bool,
    /// Seed the incumbent with the best dispatching-rule schedule.
    ///
    /// Ignored when `stop_after_first` is set.
    pub warm_start: bool,
    /// Number of parallel workers. Values above 1 need the `parallel`
    /// feature; without it the search runs on one thread.
    pub num_workers: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: None,
            node_limit: None,
            stop_after_first: false,
            warm_start: true,
            num_workers: 1,
        }
    }
}

impl SolverConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the wall-clock budget in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the maximum number of search nodes.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    /// Sets first-feasible mode.
    pub fn with_stop_after_first(mut self, stop: bool) -> Self {
        self.stop_after_first = stop;
        self
    }

    /// Enables or disables the dispatching warm start.
    pub fn with_warm_start(mut self, warm_start: bool) -> Self {
        self.warm_start = warm_start;
        self
    }

    /// Sets the number of parallel workers.
    pub fn with_num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// The time limit as a `Duration`.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_workers == 0 {
            return Err(ConfigError::Invalid("num_workers must be at least 1".into()));
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigError::Invalid("time_limit_ms must be positive".into()));
        }
        Ok(())
    }
}
