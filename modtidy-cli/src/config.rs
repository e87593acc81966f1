//! Configuration file loading for modtidy.
//!
//! Discovers and loads `modtidy.toml` from the workspace root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use modtidy_core::CoreSettings;
use modtidy_edit::DiffAlgorithm;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "modtidy.toml";

/// Top-level configuration from modtidy.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModtidyConfig {
    pub patches: PatchesConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatchesConfig {
    /// Line diff used for synthesized edits (myers, patience, lcs).
    pub diff_algorithm: DiffAlgorithm,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Memoize the analysis per manifest version.
    pub cache: bool,

    /// Per-request deadline in milliseconds.
    pub deadline_ms: Option<u64>,

    /// Tidy receipt, relative to the workspace root.
    pub receipt: Option<Utf8PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache: true,
            deadline_ms: None,
            receipt: None,
        }
    }
}

/// Discover the modtidy.toml config file.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<ModtidyConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<ModtidyConfig> {
    let config: ModtidyConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the workspace root, or return default if not found.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<ModtidyConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(ModtidyConfig::default()),
    }
}

/// CLI values that override the config file when given.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub diff_algorithm: Option<DiffAlgorithm>,
    pub deadline_ms: Option<u64>,
    pub no_cache: bool,
    pub receipt: Option<Utf8PathBuf>,
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub settings: CoreSettings,
    /// Absolute or root-relative receipt path. `None` means the analysis is
    /// unsupported.
    pub receipt: Option<Utf8PathBuf>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ModtidyConfig,
}

impl ConfigMerger {
    pub fn new(config: ModtidyConfig) -> Self {
        Self { config }
    }

    /// CLI values win; `--no-cache` turns caching off regardless of the file.
    pub fn merge(self, cli: CliOverrides) -> MergedConfig {
        let deadline_ms = cli.deadline_ms.or(self.config.analysis.deadline_ms);
        MergedConfig {
            settings: CoreSettings {
                diff_algorithm: cli
                    .diff_algorithm
                    .unwrap_or(self.config.patches.diff_algorithm),
                cache_analysis: self.config.analysis.cache && !cli.no_cache,
                deadline: deadline_ms.map(Duration::from_millis),
            },
            receipt: cli.receipt.or(self.config.analysis.receipt),
        }
    }
}
