//! # Engine Configuration
//!
//! Knobs for snapshot-wide aggregation. Everything else in the crate is a pure
//! function of its input text and needs no configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for pattern-abundance aggregation.
///
/// ```json
/// { "worker_threads": 4, "parallel_threshold": 32 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker pool size. `0` uses the global pool (one worker per core).
    pub worker_threads: usize,
    /// Species count below which aggregation stays on the calling thread.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            parallel_threshold: 64,
        }
    }
}

impl EngineConfig {
    /// Never fan out.
    pub fn sequential() -> Self {
        Self {
            worker_threads: 1,
            parallel_threshold: usize::MAX,
        }
    }

    pub fn with_worker_threads(mut self, n: usize) -> Self {
        self.worker_threads = n;
        self
    }

    pub fn with_parallel_threshold(mut self, n: usize) -> Self {
        self.parallel_threshold = n;
        self
    }

    /// Load from JSON. Missing fields take their default.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(text).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.parallel_threshold == 0 {
            return Err(Error::ConfigError(
                "parallel_threshold must be at least 1".into(),
            ));
        }
        if self.worker_threads > 1024 {
            return Err(Error::ConfigError(format!(
                "worker_threads = {} exceeds 1024",
                self.worker_threads
            )));
        }
        Ok(())
    }

    /// Whether `species` complexes are worth distributing over workers.
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub(crate) fn should_parallelize(&self, species: usize) -> bool {
        self.worker_threads != 1 && species >= self.parallel_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.worker_threads, 0);
        assert!(config.should_parallelize(64));
        assert!(!config.should_parallelize(63));
        assert!(!EngineConfig::sequential().should_parallelize(usize::MAX));
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{ "worker_threads": 4 }"#).unwrap();
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.parallel_threshold, 64);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "parallel_threshold": 0 }"#),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(Error::ConfigError(_))
        ));
    }
}
