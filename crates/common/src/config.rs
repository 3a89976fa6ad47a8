use anyhow::{Context, Result};
use serde::Deserialize;

use crate::points::{
    GenerationParams, DEFAULT_NUM_CLUSTERS, DEFAULT_STDDEV_DEGREES, DEFAULT_TOTAL_POINTS,
};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_total_points")]
    pub total_points: usize,
    #[serde(default = "default_num_clusters")]
    pub num_clusters: usize,
    #[serde(default = "default_stddev")]
    pub perturbation_stddev_degrees: f64,
    /// Fixed seed for reproducible runs; entropy is used when unset
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_total_points() -> usize {
    DEFAULT_TOTAL_POINTS
}

fn default_num_clusters() -> usize {
    DEFAULT_NUM_CLUSTERS
}

fn default_stddev() -> f64 {
    DEFAULT_STDDEV_DEGREES
}

fn default_output_path() -> String {
    "centers.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            total_points: default_total_points(),
            num_clusters: default_num_clusters(),
            perturbation_stddev_degrees: default_stddev(),
            seed: None,
            output_path: default_output_path(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        // Parse environment variables into the Config struct
        envy::from_env().context("Failed to load config from environment")
    }

    /// Same as [`Config::from_env`] but reads from the given variables only.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars).context("Failed to load config from variables")
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            total_points: self.total_points,
            num_clusters: self.num_clusters,
            perturbation_stddev_degrees: self.perturbation_stddev_degrees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_vars(Vec::new()).unwrap();
        assert_eq!(config.total_points, 100_000);
        assert_eq!(config.num_clusters, 100);
        assert_eq!(config.perturbation_stddev_degrees, 0.1);
        assert_eq!(config.seed, None);
        assert_eq!(config.output_path, "centers.json");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_vars(vars(&[
            ("TOTAL_POINTS", "10"),
            ("NUM_CLUSTERS", "3"),
            ("PERTURBATION_STDDEV_DEGREES", "0.5"),
            ("SEED", "42"),
            ("OUTPUT_PATH", "/tmp/out.json"),
        ]))
        .unwrap();

        let params = config.generation_params();
        assert_eq!(params.total_points, 10);
        assert_eq!(params.num_clusters, 3);
        assert_eq!(params.perturbation_stddev_degrees, 0.5);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.output_path, "/tmp/out.json");
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        assert!(Config::from_vars(vars(&[("NUM_CLUSTERS", "many")])).is_err());
    }
}
