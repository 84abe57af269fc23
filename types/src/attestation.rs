//! Attestations: the aggregation of validator claims for one event.

use crate::{BridgeValidator, ClaimDetails, ClaimType, Hash256, ValAddress};
use serde::{Deserialize, Serialize};

/// Lifecycle of an attestation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttestationStatus {
    /// Collecting claims, below quorum.
    Pending,
    /// Quorum reached; waiting for earlier event nonces to be applied.
    Observed,
    /// The event's effect has been applied. Terminal.
    Processed,
}

/// Result of applying an attestation's effect to ledger state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectOutcome {
    Applied,
    /// The effect could not be applied; its writes were discarded.
    Failed(String),
}

/// All claims submitted for one `(event nonce, details)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub claim_type: ClaimType,
    pub event_nonce: u64,
    pub details: ClaimDetails,
    /// Claimants in submission order. Each validator appears at most once.
    pub votes: Vec<ValAddress>,
    /// Voting power of the claimants as of the last claim.
    pub tally: u128,
    pub status: AttestationStatus,
    pub outcome: Option<EffectOutcome>,
}

impl Attestation {
    pub fn new(event_nonce: u64, details: ClaimDetails) -> Self {
        Self {
            claim_type: details.claim_type(),
            event_nonce,
            details,
            votes: Vec::new(),
            tally: 0,
            status: AttestationStatus::Pending,
            outcome: None,
        }
    }

    pub fn key(&self) -> Hash256 {
        crate::attestation_key(self.event_nonce, &self.details)
    }

    pub fn has_vote(&self, validator: &ValAddress) -> bool {
        self.votes.iter().any(|v| v == validator)
    }

    pub fn is_processed(&self) -> bool {
        self.status == AttestationStatus::Processed
    }
}

/// The bridge contract's initial configuration, recorded from a bootstrap event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeBootstrap {
    pub event_nonce: u64,
    pub peggy_id: Hash256,
    pub start_threshold: u64,
    pub validators: Vec<BridgeValidator>,
}
