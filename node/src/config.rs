//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use peggy_store::ValidatorRecord;
use peggy_types::BridgeParams;
use peggy_utils::LogFormat;

use crate::NodeError;

/// Configuration for a bridge node.
///
/// Loaded from a TOML file via [`NodeConfig::from_toml_file`] or built
/// programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the LMDB store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, e.g. `"info"` or `"info,peggy_bridge=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub params: BridgeParams,

    /// Genesis validator set: identity, orchestrator account and power.
    #[serde(default)]
    pub validators: Vec<ValidatorRecord>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./peggy_data")
}

fn default_map_size() -> usize {
    peggy_store_lmdb::DEFAULT_MAP_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check the parameters and the genesis validator set.
    ///
    /// Validator identities and orchestrator accounts must be well formed and
    /// unique; zero-power entries are allowed (they are simply unbonded).
    pub fn validate(&self) -> Result<(), NodeError> {
        self.params
            .validate()
            .map_err(|e| NodeError::Config(e.to_string()))?;
        if self.map_size == 0 {
            return Err(NodeError::Config("map_size must be positive".into()));
        }
        let mut validators = BTreeSet::new();
        let mut orchestrators = BTreeSet::new();
        for record in &self.validators {
            if !record.validator.is_valid() {
                return Err(NodeError::Config(format!(
                    "invalid validator identity {:?}",
                    record.validator.as_str()
                )));
            }
            if !record.orchestrator.is_valid() {
                return Err(NodeError::Config(format!(
                    "invalid orchestrator account {:?}",
                    record.orchestrator.as_str()
                )));
            }
            if !validators.insert(&record.validator) {
                return Err(NodeError::Config(format!(
                    "duplicate validator {}",
                    record.validator
                )));
            }
            if !orchestrators.insert(&record.orchestrator) {
                return Err(NodeError::Config(format!(
                    "orchestrator {} is assigned twice",
                    record.orchestrator
                )));
            }
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            params: BridgeParams::default(),
            validators: Vec::new(),
        }
    }
}
