use crate::filter::{self, Filters, MatchMode};
use crate::frame::Verdict;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Unknown preset '{name}'. Available presets: {available}")]
    UnknownPreset { name: String, available: String },
}

/// Named filter presets loaded from a TOML profile file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowlensConfig {
    pub presets: BTreeMap<String, FilterPreset>,
}

impl FlowlensConfig {
    pub fn preset(&self, name: &str) -> Result<&FilterPreset, ConfigError> {
        self.presets.get(name).ok_or_else(|| ConfigError::UnknownPreset {
            name: name.to_string(),
            available: if self.presets.is_empty() {
                "(none)".to_string()
            } else {
                self.presets.keys().cloned().collect::<Vec<_>>().join(", ")
            },
        })
    }
}

/// One stored filter configuration. The clause list is kept as expression
/// text so profiles stay hand-editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPreset {
    /// Whitespace-separated clauses in the lenient grammar.
    pub filter: String,
    pub namespace: Option<String>,
    pub verdict: Option<Verdict>,
    pub http_status: Option<String>,
    pub skip_host: bool,
    pub skip_kube_dns: bool,
    pub skip_remote_node: bool,
    pub skip_prometheus_app: bool,
    pub skip_kube_api_server: bool,
    pub mode: MatchMode,
}

impl FilterPreset {
    pub fn to_filters(&self) -> Filters {
        Filters {
            namespace: self.namespace.clone(),
            verdict: self.verdict,
            http_status: self.http_status.clone(),
            entries: filter::parse_expression(&self.filter),
            skip_host: self.skip_host,
            skip_kube_dns: self.skip_kube_dns,
            skip_remote_node: self.skip_remote_node,
            skip_prometheus_app: self.skip_prometheus_app,
            skip_kube_api_server: self.skip_kube_api_server,
            mode: self.mode,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FlowlensConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<FlowlensConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<FlowlensConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static FlowlensConfig {
    static DEFAULT_CONFIG: LazyLock<FlowlensConfig> = LazyLock::new(FlowlensConfig::default);
    &DEFAULT_CONFIG
}
