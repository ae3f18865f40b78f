use crate::domain::size::ThumbnailSize;
use anyhow::{ensure, Context};
use serde::Deserialize;
use std::path::PathBuf;

const ENV_PREFIX: &str = "THUMBNAILER_";

/// What to do with the rest of the batch when a source image cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDecodeError {
    #[default]
    SkipRecord,
    AbortBatch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_sizes")]
    pub sizes: Vec<ThumbnailSize>,
    #[serde(default)]
    pub on_decode_error: OnDecodeError,
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    #[serde(default = "default_store_endpoint")]
    pub store_endpoint: String,
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub trace_stdout: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Config::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> anyhow::Result<Config>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .context("Could not read configuration from environment")?;
        ensure!(
            !config.sizes.is_empty(),
            "{ENV_PREFIX}SIZES must list at least one size"
        );
        Ok(config)
    }
}

fn default_sizes() -> Vec<ThumbnailSize> {
    [200, 400, 800]
        .into_iter()
        .filter_map(ThumbnailSize::new)
        .collect()
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_store_endpoint() -> String {
    String::from("https://storage.googleapis.com")
}

fn default_store_timeout_secs() -> u64 {
    60
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    String::from("info")
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
    fn defaults_when_unset() {
        let config = Config::from_vars(Vec::new()).unwrap();
        let sizes: Vec<u32> = config.sizes.iter().map(|s| s.px()).collect();
        assert_eq!(sizes, vec![200, 400, 800]);
        assert_eq!(config.on_decode_error, OnDecodeError::SkipRecord);
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp"));
        assert_eq!(config.port, 8080);
        assert!(!config.trace_stdout);
    }

    #[test]
    fn reads_prefixed_values() {
        let config = Config::from_vars(vars(&[
            ("THUMBNAILER_SIZES", "400,800"),
            ("THUMBNAILER_ON_DECODE_ERROR", "abort_batch"),
            ("THUMBNAILER_SCRATCH_DIR", "/var/scratch"),
            ("THUMBNAILER_STORE_ENDPOINT", "http://localhost:9000"),
            ("THUMBNAILER_PORT", "9090"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();
        let sizes: Vec<u32> = config.sizes.iter().map(|s| s.px()).collect();
        assert_eq!(sizes, vec![400, 800]);
        assert_eq!(config.on_decode_error, OnDecodeError::AbortBatch);
        assert_eq!(config.scratch_dir, PathBuf::from("/var/scratch"));
        assert_eq!(config.store_endpoint, "http://localhost:9000");
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(Config::from_vars(vars(&[("THUMBNAILER_SIZES", "200,0")])).is_err());
    }

    #[test]
    fn unknown_decode_policy_is_rejected() {
        assert!(Config::from_vars(vars(&[("THUMBNAILER_ON_DECODE_ERROR", "retry")])).is_err());
    }
}
