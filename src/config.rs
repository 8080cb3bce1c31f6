use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

use crate::source::MAX_PAGE_SIZE;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub database: Database,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub groups: GroupsConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Database {
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// directory holding `<credential>.json` library exports
    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            exports_dir: default_exports_dir(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroupsConfig {
    /// how many candidate ids the registry tries before giving up
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: usize,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            max_id_attempts: default_max_id_attempts(),
        }
    }
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_max_id_attempts() -> usize {
    32
}
