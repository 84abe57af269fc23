//! Validator claims about events observed on the external chain.

use crate::{AccAddress, BridgeValidator, Erc20Token, EthAddress, Hash256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// The kind of external-chain event a claim reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// Tokens were locked in the bridge contract for a ledger receiver.
    Deposit,
    /// An outgoing batch was executed by the bridge contract.
    WithdrawalBatch,
    /// The bridge contract switched to a new validator set.
    ValsetUpdated,
    /// The bridge contract was deployed and initialised.
    Bootstrap,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Deposit => "deposit",
            ClaimType::WithdrawalBatch => "withdrawal_batch",
            ClaimType::ValsetUpdated => "valset_updated",
            ClaimType::Bootstrap => "bootstrap",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event-specific details of a claim. Two claims only count towards the same
/// attestation when their details are identical.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimDetails {
    Deposit {
        erc20_token: Erc20Token,
        ethereum_sender: EthAddress,
        cosmos_receiver: AccAddress,
    },
    WithdrawalBatch {
        token_contract: EthAddress,
        batch_nonce: u64,
    },
    ValsetUpdated {
        valset_nonce: u64,
    },
    Bootstrap {
        peggy_id: Hash256,
        start_threshold: u64,
        validators: Vec<BridgeValidator>,
    },
}

impl ClaimDetails {
    pub fn claim_type(&self) -> ClaimType {
        match self {
            ClaimDetails::Deposit { .. } => ClaimType::Deposit,
            ClaimDetails::WithdrawalBatch { .. } => ClaimType::WithdrawalBatch,
            ClaimDetails::ValsetUpdated { .. } => ClaimType::ValsetUpdated,
            ClaimDetails::Bootstrap { .. } => ClaimType::Bootstrap,
        }
    }

    /// Canonical byte encoding used for attestation keys.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("claim details are always serializable")
    }
}

/// One validator assertion: an event nonce assigned by the external chain plus details.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EthereumClaim {
    pub event_nonce: u64,
    pub details: ClaimDetails,
}

impl EthereumClaim {
    pub fn new(event_nonce: u64, details: ClaimDetails) -> Self {
        Self {
            event_nonce,
            details,
        }
    }

    pub fn claim_type(&self) -> ClaimType {
        self.details.claim_type()
    }

    pub fn attestation_key(&self) -> Hash256 {
        attestation_key(self.event_nonce, &self.details)
    }
}

/// Deterministic attestation key: `keccak256(event_nonce_be ++ canonical(details))`.
pub fn attestation_key(event_nonce: u64, details: &ClaimDetails) -> Hash256 {
    let mut hasher = Keccak256::new();
    hasher.update(event_nonce.to_be_bytes());
    hasher.update(details.canonical_bytes());
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    Hash256::new(output)
}
