use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::agent_model::AgentConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-saver",
    version,
    about = "Manage protected sites and saved form data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-saver.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Store file, overriding the config file
    #[arg(long, global = true)]
    pub store: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create empty records in the store if they are missing
    Init,

    /// Manage the protected site list
    Sites {
        #[command(subcommand)]
        action: SitesCommand,
    },

    /// Inspect or clear saved form data
    Data {
        #[command(subcommand)]
        action: DataCommand,
    },

    /// Show protected site and saved form counts
    Stats,

    /// Serve saveFormData/getFormData requests as NDJSON on stdin/stdout
    Relay,
}

#[derive(Subcommand, Debug)]
pub enum SitesCommand {
    /// List protected sites
    List,

    /// Protect a site (URL or hostname)
    Add { site: String },

    /// Stop protecting a site (URL or hostname)
    Remove { site: String },

    /// Flip protection for a site (URL or hostname)
    Toggle { site: String },
}

#[derive(Subcommand, Debug)]
pub enum DataCommand {
    /// Print the snapshot saved for a page URL
    Show { url: String },

    /// Delete saved data for every page of a site
    ClearSite {
        site: String,

        /// Skip the confirmation refusal
        #[arg(long)]
        yes: bool,
    },

    /// Delete all sites and saved data
    ClearAll {
        /// Skip the confirmation refusal
        #[arg(long)]
        yes: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-saver.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_autosave_ms")]
    pub autosave_delay_ms: u64,

    #[serde(default = "default_thousand")]
    pub rebind_delay_ms: u64,

    #[serde(default = "default_thousand")]
    pub retry_interval_ms: u64,

    #[serde(default = "default_ten")]
    pub max_restore_attempts: u32,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 500,
            rebind_delay_ms: 1000,
            retry_interval_ms: 1000,
            max_restore_attempts: 10,
        }
    }
}

impl AgentSection {
    pub fn to_agent_config(&self) -> AgentConfig {
        AgentConfig {
            autosave_delay: Duration::from_millis(self.autosave_delay_ms),
            rebind_delay: Duration::from_millis(self.rebind_delay_ms),
            retry_interval: Duration::from_millis(self.retry_interval_ms),
            max_restore_attempts: self.max_restore_attempts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    /// JSONL journal of agent decisions; disabled when unset
    pub path: Option<String>,
}

// Serde default helpers
fn default_store_path() -> String { "form-saver-store.json".to_string() }
fn default_autosave_ms() -> u64 { 500 }
fn default_thousand() -> u64 { 1000 }
fn default_ten() -> u32 { 10 }
fn default_level() -> String { "info".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Read the YAML config. A missing file yields defaults; a malformed one is
/// an error so the caller can report it once logging is up.
pub fn read_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let config_path = path.unwrap_or("form-saver.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).map_err(|e| ConfigError::Malformed {
            path: config_path.to_string(),
            source: e,
        }),
        Err(_) => Ok(AppConfig::default()),
    }
}

/// Store path resolution: CLI flag > config file > default.
pub fn resolve_store_path(cli_store: Option<&str>, config: &AppConfig) -> String {
    cli_store
        .map(str::to_string)
        .unwrap_or_else(|| config.store.path.clone())
}
