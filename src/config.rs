use crate::{cli::Cli, error::BoardResult, storage::CacheOptions};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::Level;

const TRACE_LEVELS: [&'static str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
const LOCAL_SETTINGS_YAML_FILE: &str = ".env.local.yaml";
const ENV_PREFIX: &str = "CENTERBOARD_";

// All settings may be configured via environment variables. Example:
// CENTERBOARD_CACHE_TTL_SEC=60 would set cache_ttl_sec to 60.
// Values from the command line override the environment, which overrides
// the YAML file.
#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    #[serde(default = "default_trace_level")]
    trace_level: String,
    #[serde(default = "default_store_base_url")]
    pub store_base_url: String,
    pub store_api_token: Option<String>,
    // When set, students and classes are read from this JSON export.
    pub store_fixture: Option<PathBuf>,
    #[serde(default = "default_store_timeout_sec")]
    pub store_timeout_sec: u64,
    #[serde(default = "default_cache_ttl_sec")]
    pub cache_ttl_sec: i64,
    #[serde(default = "default_grade_lookup_concurrency")]
    pub grade_lookup_concurrency: usize,
    #[serde(default = "default_refresh_schedule")]
    pub refresh_schedule: String,
}

impl Settings {
    pub fn new(cli: &Cli) -> BoardResult<Self> {
        let local_settings_yaml_file = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(LOCAL_SETTINGS_YAML_FILE));

        let settings = Self::figment(&local_settings_yaml_file)
            .merge(Serialized::defaults(cli))
            .extract()?;
        Ok(settings)
    }

    fn figment(local_settings_yaml_file: &Path) -> Figment {
        match local_settings_yaml_file.exists() {
            true => {
                // Tracing is not set up yet, and stdout carries the leaderboards.
                eprintln!(
                    "Found '{}' file, loading local configuration.",
                    local_settings_yaml_file.display()
                );
                Figment::new()
                    .merge(Yaml::file(local_settings_yaml_file))
                    .merge(Env::prefixed(ENV_PREFIX))
            }
            false => Figment::new().merge(Env::prefixed(ENV_PREFIX)),
        }
    }

    pub fn get_trace_level(&self) -> Level {
        get_trace_level(&self.trace_level)
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            ttl: chrono::Duration::seconds(self.cache_ttl_sec),
            fetch_timeout: self.store_timeout(),
            grade_lookup_concurrency: self.grade_lookup_concurrency,
        }
    }

    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.store_timeout_sec)
    }
}

fn get_trace_level(level_str: &str) -> Level {
    match level_str {
        level if level == TRACE_LEVELS[0] => Level::TRACE,
        level if level == TRACE_LEVELS[1] => Level::DEBUG,
        level if level == TRACE_LEVELS[2] => Level::INFO,
        level if level == TRACE_LEVELS[3] => Level::WARN,
        level if level == TRACE_LEVELS[4] => Level::ERROR,
        // Default trace level
        _ => Level::INFO,
    }
}

fn default_trace_level() -> String {
    "INFO".to_string()
}

fn default_store_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_store_timeout_sec() -> u64 {
    5
}

fn default_cache_ttl_sec() -> i64 {
    crate::storage::DEFAULT_TTL_SEC
}

fn default_grade_lookup_concurrency() -> usize {
    8
}

fn default_refresh_schedule() -> String {
    // At second 0 of every 5th minute.
    "0 */5 * * * *".to_string()
}
