//! Configuration for the criteria engine.
//!
//! Criteria definitions are delivered by a server and evaluated on the device
//! on every local event append, so the engine bounds the work a single
//! definition can cause. All limits have defaults suitable for mobile clients
//! and can be overridden in code or loaded from YAML.

use crate::error::{CriteriaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a leaf with `minMatch > maxMatch` is evaluated.
///
/// Such a range can only come from an authoring error. The policy is fixed per
/// engine so the behavior is deterministic across evaluations.
///
/// ```rust
/// use criteria_engine::InvertedRangePolicy;
///
/// assert_eq!(InvertedRangePolicy::default(), InvertedRangePolicy::NeverMatch);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvertedRangePolicy {
    /// The leaf is never satisfied.
    #[default]
    NeverMatch,
    /// The bounds are swapped, so `minMatch: 3, maxMatch: 2` means `[2, 3]`.
    Swap,
}

/// Configuration for batch evaluation over many event logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Minimum number of event logs in a batch before rayon is used.
    pub min_batch_size_for_parallelism: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            min_batch_size_for_parallelism: 64,
        }
    }
}

/// Engine configuration.
///
/// # Example
/// ```rust
/// use criteria_engine::{EngineConfig, InvertedRangePolicy};
///
/// let config = EngineConfig::new()
///     .with_max_query_depth(16)
///     .with_inverted_range_policy(InvertedRangePolicy::Swap);
///
/// assert_eq!(config.max_query_depth, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest `searchQueries` nesting that is compiled. Deeper nodes never match.
    pub max_query_depth: usize,
    /// Maximum number of values a single field path may resolve to for one event.
    pub max_field_fanout: usize,
    /// Compiled size limit in bytes for `MatchesRegex` patterns.
    pub max_regex_size: usize,
    /// Evaluation of leaves whose `minMatch` exceeds `maxMatch`.
    pub inverted_range: InvertedRangePolicy,
    /// Evaluate batches of event logs on the rayon thread pool.
    pub enable_parallel_processing: bool,
    /// Parallel processing configuration
    pub parallel: ParallelConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_query_depth: 32,
            max_field_fanout: 1024,
            max_regex_size: 1024 * 1024,
            inverted_range: InvertedRangePolicy::default(),
            enable_parallel_processing: false,
            parallel: ParallelConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from YAML text. Missing keys keep their defaults.
    ///
    /// ```rust
    /// use criteria_engine::EngineConfig;
    ///
    /// let config = EngineConfig::from_yaml_str("max_field_fanout: 64\n").unwrap();
    /// assert_eq!(config.max_field_fanout, 64);
    /// assert_eq!(config.max_query_depth, 32);
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Reject limits that would make every evaluation fail.
    pub fn validate(&self) -> Result<()> {
        if self.max_query_depth == 0 {
            return Err(CriteriaError::Config(
                "max_query_depth must be at least 1".to_string(),
            ));
        }
        if self.max_field_fanout == 0 {
            return Err(CriteriaError::Config(
                "max_field_fanout must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the maximum query nesting depth.
    pub fn with_max_query_depth(mut self, depth: usize) -> Self {
        self.max_query_depth = depth;
        self
    }

    /// Set the maximum number of values resolved per field path.
    pub fn with_max_field_fanout(mut self, fanout: usize) -> Self {
        self.max_field_fanout = fanout;
        self
    }

    /// Set the compiled regex size limit.
    pub fn with_max_regex_size(mut self, bytes: usize) -> Self {
        self.max_regex_size = bytes;
        self
    }

    /// Set the policy for inverted `minMatch`/`maxMatch` ranges.
    pub fn with_inverted_range_policy(mut self, policy: InvertedRangePolicy) -> Self {
        self.inverted_range = policy;
        self
    }

    /// Enable or disable parallel batch evaluation.
    pub fn with_parallel_processing(mut self, enable: bool) -> Self {
        self.enable_parallel_processing = enable;
        self
    }

    /// Set the minimum batch size for parallel evaluation.
    pub fn with_min_batch_size_for_parallelism(mut self, min_size: usize) -> Self {
        self.parallel.min_batch_size_for_parallelism = min_size;
        self
    }
}
