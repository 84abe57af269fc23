//! Bridge parameters, shared by every replica through genesis configuration.

use crate::{Hash256, TypeError};
use serde::{Deserialize, Serialize};

/// Basis-point denominator for thresholds.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Parameters governing batching and attestation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeParams {
    /// Bridge instance identifier, mixed into every checkpoint (at most 32 bytes).
    #[serde(default = "default_peggy_id")]
    pub peggy_id: String,

    /// Maximum number of transfers in a batch built by `RequestBatch`.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Share of total voting power an attestation must exceed to be observed,
    /// in basis points (6700 = 67%).
    #[serde(default = "default_attestation_threshold_bps")]
    pub attestation_threshold_bps: u32,
}

fn default_peggy_id() -> String {
    "peggy".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_attestation_threshold_bps() -> u32 {
    6700
}

impl BridgeParams {
    /// The bridge id as the `bytes32` word used in checkpoints.
    pub fn peggy_id_bytes(&self) -> Hash256 {
        Hash256::from_short_str(&self.peggy_id).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), TypeError> {
        if self.peggy_id.is_empty() || self.peggy_id.len() > 32 {
            return Err(TypeError::InvalidParams(format!(
                "peggy_id must be 1..=32 bytes, got {}",
                self.peggy_id.len()
            )));
        }
        if self.batch_size == 0 {
            return Err(TypeError::InvalidParams("batch_size must be positive".into()));
        }
        if self.attestation_threshold_bps == 0 || self.attestation_threshold_bps > BPS_DENOMINATOR {
            return Err(TypeError::InvalidParams(format!(
                "attestation_threshold_bps must be in 1..={BPS_DENOMINATOR}, got {}",
                self.attestation_threshold_bps
            )));
        }
        Ok(())
    }

    /// Whether `tally` strictly exceeds the configured share of `total_power`.
    pub fn exceeds_threshold(&self, tally: u128, total_power: u128) -> bool {
        if total_power == 0 {
            return false;
        }
        tally.saturating_mul(BPS_DENOMINATOR as u128)
            > total_power.saturating_mul(self.attestation_threshold_bps as u128)
    }
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self {
            peggy_id: default_peggy_id(),
            batch_size: default_batch_size(),
            attestation_threshold_bps: default_attestation_threshold_bps(),
        }
    }
}
