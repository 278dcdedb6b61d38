//! Run configuration: store location and input sources
//!
//! Read from TOML. Lookup order is an explicit `--config` file, then
//! `./sales-etl.toml`, then `<config dir>/sales-etl/config.toml`, then the
//! built-in defaults. Relative paths are resolved against the working
//! directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::sales::Region;
use crate::store::StoreConfig;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "sales-etl.toml";

/// One regional input file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub region: Region,
    pub path: PathBuf,
    /// Worksheet name; the first sheet when absent
    #[serde(default)]
    pub sheet: Option<String>,
}

impl SourceConfig {
    pub fn new(region: Region, path: impl Into<PathBuf>) -> Self {
        Self {
            region,
            path: path.into(),
            sheet: None,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: StoreConfig,
    /// Read and merged in this order; earlier sources win duplicate order ids
    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: StoreConfig::default(),
            sources: default_sources(),
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(Region::fixed("A"), "order_region_a.xlsx"),
        SourceConfig::new(Region::fixed("B"), "order_region_b.xlsx"),
    ]
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Resolve the configuration using the lookup order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file does not exist: {}", path.display());
            }
            return Self::from_file(path);
        }

        for candidate in default_locations() {
            if candidate.is_file() {
                log::info!("Using config file {}", candidate.display());
                return Self::from_file(&candidate);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("At least one source must be configured");
        }
        if self.database.path.as_os_str().is_empty() {
            bail!("Database path cannot be empty");
        }

        let mut labels: Vec<&Region> = self.sources.iter().map(|s| &s.region).collect();
        labels.sort();
        if labels.windows(2).any(|w| w[0] == w[1]) {
            log::warn!("Several sources share a region label; their totals will be combined");
        }

        Ok(())
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("sales-etl").join("config.toml"));
    }
    locations
}
