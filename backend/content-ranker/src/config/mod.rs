//! Configuration for content-ranker, loaded from environment variables
use serde::Deserialize;

use crate::error::{RankerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotBackend {
    File,
    Redis,
    None,
}

/// Main configuration struct
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Probability of shuffling instead of sorting by learned value
    #[serde(default = "default_bandit_epsilon")]
    pub bandit_epsilon: f64,

    /// Q-learning rate of the boost agent
    #[serde(default = "default_agent_alpha")]
    pub agent_alpha: f64,

    /// Q-learning discount of the boost agent
    #[serde(default = "default_agent_gamma")]
    pub agent_gamma: f64,

    /// Probability of a random boost action
    #[serde(default = "default_agent_epsilon")]
    pub agent_epsilon: f64,

    /// Feedback events kept for retraining
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Events replayed per lock acquisition while retraining
    #[serde(default = "default_retrain_chunk_size")]
    pub retrain_chunk_size: usize,

    #[serde(default = "default_snapshot_backend")]
    pub snapshot_backend: SnapshotBackend,

    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_snapshot_redis_key")]
    pub snapshot_redis_key: String,

    /// Insert three demo items at startup and after every reset
    #[serde(default)]
    pub seed_demo_content: bool,

    /// Fixed seed for the engine's random source
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_service_name() -> String {
    "content-ranker".to_string()
}

fn default_bandit_epsilon() -> f64 {
    0.15
}

fn default_agent_alpha() -> f64 {
    0.2
}

fn default_agent_gamma() -> f64 {
    0.9
}

fn default_agent_epsilon() -> f64 {
    0.1
}

fn default_history_capacity() -> usize {
    10_000
}

fn default_retrain_chunk_size() -> usize {
    1_000
}

fn default_snapshot_backend() -> SnapshotBackend {
    SnapshotBackend::File
}

fn default_snapshot_path() -> String {
    "metrics_history.jsonl".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_snapshot_redis_key() -> String {
    "content_ranker:metrics_history".to_string()
}

impl Config {
    /// Load from the process environment, reading `.env` first when present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from explicit key/value pairs (upper-case keys, as in the environment)
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(pairs)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("BANDIT_EPSILON", self.bandit_epsilon),
            ("AGENT_ALPHA", self.agent_alpha),
            ("AGENT_GAMMA", self.agent_gamma),
            ("AGENT_EPSILON", self.agent_epsilon),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RankerError::Validation(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.history_capacity == 0 {
            return Err(RankerError::Validation(
                "HISTORY_CAPACITY must be positive".to_string(),
            ));
        }
        if self.retrain_chunk_size == 0 {
            return Err(RankerError::Validation(
                "RETRAIN_CHUNK_SIZE must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_pairs(Vec::<(String, String)>::new()).unwrap();

        assert_eq!(config.http_port, 8000);
        assert_eq!(config.bandit_epsilon, 0.15);
        assert_eq!(config.agent_alpha, 0.2);
        assert_eq!(config.agent_gamma, 0.9);
        assert_eq!(config.agent_epsilon, 0.1);
        assert_eq!(config.history_capacity, 10_000);
        assert_eq!(config.snapshot_backend, SnapshotBackend::File);
        assert!(!config.seed_demo_content);
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_pairs(pairs(&[
            ("HTTP_PORT", "9100"),
            ("SNAPSHOT_BACKEND", "redis"),
            ("SEED_DEMO_CONTENT", "true"),
            ("RNG_SEED", "7"),
        ]))
        .unwrap();

        assert_eq!(config.http_port, 9100);
        assert_eq!(config.snapshot_backend, SnapshotBackend::Redis);
        assert!(config.seed_demo_content);
        assert_eq!(config.rng_seed, Some(7));
    }

    #[test]
    fn test_rejects_out_of_range_epsilon() {
        let result = Config::from_pairs(pairs(&[("BANDIT_EPSILON", "1.5")]));
        assert!(matches!(result, Err(RankerError::Validation(_))));
    }

    #[test]
    fn test_rejects_zero_history_capacity() {
        let result = Config::from_pairs(pairs(&[("HISTORY_CAPACITY", "0")]));
        assert!(matches!(result, Err(RankerError::Validation(_))));
    }
}
