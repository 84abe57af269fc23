//! Peggy bridge node.
//!
//! Wires the bridge keeper to a persistent store and a genesis validator
//! set, and delivers messages to it block by block:
//! - Loads [`NodeConfig`] from TOML
//! - Builds the staking registry from the configured validators
//! - Tracks the block height supplied by the environment
//! - Counts accepted and rejected messages in Prometheus metrics

pub mod app;
pub mod config;
pub mod error;
pub mod metrics;
pub mod tracing_spans;

pub use app::{AppStatus, BridgeApp, TokenStatus};
pub use config::NodeConfig;
pub use error::NodeError;
pub use metrics::NodeMetrics;

use peggy_store_lmdb::{check_data_dir, check_integrity, LmdbStore};

/// Open (or create) the LMDB store under the configured data directory,
/// check it, and build the app over it.
pub fn open_app(config: &NodeConfig) -> Result<BridgeApp<LmdbStore>, NodeError> {
    config.validate()?;
    check_data_dir(&config.data_dir)?;
    let store = LmdbStore::open(&config.data_dir, config.map_size)?;
    let report = check_integrity(store.env())?;
    if !report.is_healthy() {
        return Err(NodeError::Integrity(report.errors.join("; ")));
    }
    tracing::debug!(entries = report.state_entries, "store integrity verified");
    BridgeApp::from_config(config, store)
}
