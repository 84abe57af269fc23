//! Fundamental types for the Peggy bridge.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! ledger and external-chain addresses, coins and bridged denominators, outgoing
//! transfers and batches, validator sets, claims, attestations, and bridge parameters.

pub mod address;
pub mod attestation;
pub mod batch;
pub mod claim;
pub mod coin;
pub mod confirm;
pub mod denom;
pub mod error;
pub mod hash;
pub mod params;
pub mod valset;

pub use address::{AccAddress, EthAddress, ValAddress};
pub use attestation::{Attestation, AttestationStatus, BridgeBootstrap, EffectOutcome};
pub use batch::{OutgoingTransferTx, OutgoingTx, OutgoingTxBatch};
pub use claim::{attestation_key, ClaimDetails, ClaimType, EthereumClaim};
pub use coin::{Coin, Denom, Erc20Token};
pub use confirm::{BatchConfirm, ValsetConfirm};
pub use denom::{voucher_denom, BridgedDenominator, VOUCHER_DENOM_PREFIX};
pub use error::TypeError;
pub use hash::Hash256;
pub use params::BridgeParams;
pub use valset::{BridgeValidator, Valset};
